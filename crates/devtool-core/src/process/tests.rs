use std::io::Write;

use super::*;

#[test]
fn probe_free_port_returns_a_nonzero_port() {
    let port = probe_free_port().unwrap();
    assert!(port > 0);
}

#[test]
fn two_probes_can_return_different_ports() {
    // Not a hard guarantee (the OS could reuse one immediately), but in
    // practice two back-to-back binds land on different ephemeral ports.
    let a = probe_free_port().unwrap();
    let b = probe_free_port().unwrap();
    assert!(a > 0 && b > 0);
}

#[test]
fn temp_user_data_dir_creates_a_real_directory() {
    let (path, guard) = prepare_user_data_dir(&UserDataDir::Temp).unwrap();
    assert!(path.is_dir());
    assert!(guard.is_some());
}

#[test]
fn persist_user_data_dir_returns_the_given_path_without_a_guard() {
    let dir = tempfile::tempdir().unwrap();
    let (path, guard) = prepare_user_data_dir(&UserDataDir::Persist(dir.path().to_path_buf()))
        .unwrap();
    assert_eq!(path, dir.path());
    assert!(guard.is_none());
}

#[test]
fn template_user_data_dir_copies_contents_into_a_fresh_temp_dir() {
    let template = tempfile::tempdir().unwrap();
    let mut file = std::fs::File::create(template.path().join("Preferences")).unwrap();
    file.write_all(b"{}").unwrap();

    let (path, guard) =
        prepare_user_data_dir(&UserDataDir::TempFromTemplate(template.path().to_path_buf()))
            .unwrap();
    assert!(guard.is_some());
    assert_ne!(path, template.path());
    assert!(path.join("Preferences").exists());
}

#[test]
fn starting_a_nonexistent_binary_fails_with_binary_not_found() {
    let result = ProcessManager::start(
        Path::new("/nonexistent/not-a-real-browser"),
        9222,
        &UserDataDir::Temp,
        &[],
    );
    assert!(matches!(result, Err(CoreError::BrowserBinaryNotFound)));
}
