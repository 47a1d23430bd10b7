use std::fs;

use assert_cmd::Command;

#[test]
fn runs() {
    let mut cmd = Command::cargo_bin("pklot-prep").unwrap();
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("pklot-prep"));
}

#[test]
fn outputs_version() {
    let mut cmd = Command::cargo_bin("pklot-prep").unwrap();
    cmd.arg("-V");
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("pklot-prep"));
}

// Convert subcommand tests

#[test]
fn convert_writes_labels_and_moves_images() {
    let temp = tempfile::tempdir().unwrap();
    let split = temp.path().join("train");
    fs::create_dir_all(&split).unwrap();
    fs::write(
        split.join("_annotations.coco.json"),
        r#"{
            "images": [{"id": 0, "width": 100, "height": 200, "file_name": "lot.jpg"}],
            "annotations": [
                {"id": 0, "image_id": 0, "category_id": 1, "bbox": [10.0, 20.0, 30.0, 40.0]}
            ]
        }"#,
    )
    .unwrap();
    fs::write(split.join("lot.jpg"), b"jpegdata").unwrap();

    let mut cmd = Command::cargo_bin("pklot-prep").unwrap();
    cmd.arg("convert").arg(temp.path());
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Processing annotations and images..."));

    let label = fs::read_to_string(split.join("labels/lot.txt")).unwrap();
    assert_eq!(label, "0 0.250000 0.200000 0.300000 0.200000 0.000000\n");
    assert!(split.join("images/lot.jpg").is_file());
}

#[test]
fn convert_nonexistent_directory_fails() {
    let mut cmd = Command::cargo_bin("pklot-prep").unwrap();
    cmd.args(["convert", "no_such_dataset_dir"]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("error:"));
}

#[test]
fn convert_malformed_json_fails() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("_annotations.coco.json"), "{broken").unwrap();

    let mut cmd = Command::cargo_bin("pklot-prep").unwrap();
    cmd.arg("convert").arg(temp.path());
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("Failed to parse COCO JSON"));
}

// Rename subcommand tests

#[test]
fn rename_strips_fingerprints() {
    let temp = tempfile::tempdir().unwrap();
    let images = temp.path().join("train/images");
    fs::create_dir_all(&images).unwrap();
    fs::write(images.join("lot_0012.rf.a1b2c3d4e5f6.jpg"), b"jpegdata").unwrap();

    let mut cmd = Command::cargo_bin("pklot-prep").unwrap();
    cmd.arg("rename").arg(temp.path());
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Renaming image files..."))
        .stdout(predicates::str::contains("lot_0012.jpg"));

    assert!(images.join("lot_0012.jpg").is_file());
    assert!(!images.join("lot_0012.rf.a1b2c3d4e5f6.jpg").exists());
}

// Download subcommand tests (no network: only argument validation)

#[test]
fn download_rejects_malformed_dataset_ref() {
    let temp = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("pklot-prep").unwrap();
    cmd.arg("download")
        .arg(temp.path().join("dataset"))
        .args(["--dataset", "not-a-ref"]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("Invalid dataset reference"));
}
