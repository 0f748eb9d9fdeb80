use super::*;

#[test]
fn builder_defaults_to_headless_temp_profile() {
    let builder = Browser::chrome();
    assert!(builder.headless);
    assert!(matches!(builder.user_data_dir, UserDataDir::Temp));
    assert_eq!(builder.product, Product::Chrome);
}

#[test]
fn explicit_nonexistent_executable_path_is_rejected() {
    let builder = Browser::chrome().executable_path("/nonexistent/not-a-real-browser");
    let result = builder.find_executable();
    assert!(matches!(result, Err(CoreError::BrowserBinaryNotFound)));
}

#[tokio::test]
async fn launching_with_a_nonexistent_binary_fails() {
    let result = Browser::edge()
        .executable_path("/nonexistent/not-a-real-browser")
        .launch()
        .await;
    assert!(matches!(result, Err(CoreError::BrowserBinaryNotFound)));
}

#[test]
fn ws_base_strips_the_devtools_suffix() {
    let connection = Arc::new(Connection::new(
        "ws://127.0.0.1:9222/devtools/browser/abc-123".to_string(),
    ));
    let browser = Browser {
        connection,
        process: tokio::sync::Mutex::new(None),
        registry: tokio::sync::Mutex::new(HashMap::new()),
        creation_order: tokio::sync::Mutex::new(Vec::new()),
        proxy_store: Arc::new(ProxyAuthStore::new()),
        fetch_auth_installed: AtomicBool::new(false),
    };
    assert_eq!(browser.ws_base(), "ws://127.0.0.1:9222");
}
