use std::fs;
use std::sync::Arc;

use recorder_codegen::{FileOutput, Language};
use soulbrowser_recorder::{read_event_log, replay, DryRunBrowser, RecorderConfig};

const LOG: &str = r##"
# search flow recorded against example.com
{"event":"page_opened","page":"p1","url":"https://example.com/"}
{"event":"record_action","page":"p1","action":{"name":"fill","selector":"input[name=\"q\"]","text":"ru"}}
{"event":"record_action","page":"p1","action":{"name":"fill","selector":"input[name=\"q\"]","text":"rust"}}
{"event":"perform_action","page":"p1","action":{"name":"press","selector":"input[name=\"q\"]","key":"Enter","modifiers":0}}
{"event":"frame_navigated","page":"p1","frame":{"url":"https://example.com/search?q=rust"}}
{"event":"idle"}
{"event":"commit_last_action"}
{"event":"perform_action","page":"p1","action":{"name":"check","selector":"#exact"}}
"##;

#[tokio::test]
async fn replays_log_into_python_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("search.py");
    let config = RecorderConfig {
        target: Language::Python,
        echo: false,
        output: Some(path.clone()),
        ..RecorderConfig::default()
    };

    let events = read_event_log(LOG.as_bytes()).unwrap();
    assert_eq!(events.len(), 8);

    let browser = DryRunBrowser::new();
    let (_, stats) = replay(
        &config,
        events,
        Arc::new(browser.clone()),
        FileOutput::new(path.clone()),
    )
    .await
    .unwrap();
    assert_eq!(stats.recorded, 2);
    assert_eq!(stats.performed, 2);
    assert_eq!(stats.signals, 2);

    let script = fs::read_to_string(&path).unwrap();
    assert!(script.starts_with("from playwright import sync_playwright\n\ndef run(playwright):"));
    assert_eq!(script.matches("# Fill input[name=\"q\"]").count(), 1);
    assert!(script.contains("page.fill(\"input[name=\\\"q\\\"]\", \"rust\")"));
    assert!(script.contains("page.press(\"input[name=\\\"q\\\"]\", \"Enter\")"));
    assert!(script.contains("# assert page.url == \"https://example.com/search?q=rust\""));
    assert!(script.contains("page.check(\"#exact\")"));
    assert!(script.contains("    context.close()\n    browser.close()"));

    assert_eq!(
        browser.calls()[3..],
        [
            "press(input[name=\"q\"], Enter)".to_string(),
            "check(#exact)".to_string(),
        ]
    );
}

#[test]
fn malformed_log_reports_line() {
    let log = "{\"event\":\"page_opened\",\"page\":\"p1\"}\n{\"event\":\"perform_action\",\"page\":\"p1\"}\n";
    let err = read_event_log(log.as_bytes()).unwrap_err();
    assert_eq!(err.line(), Some(2));
}
