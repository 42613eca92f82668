use std::sync::Arc;
use std::time::Duration;

use recorder_codegen::{
    Action, CodeGenerator, FileOutput, FrameRef, Language, MemoryOutput, Modifiers, MouseButton,
};
use soulbrowser_core_types::PageId;
use selector_synth::DomSnapshot;
use soulbrowser_recorder::{
    replay, DryRunBrowser, PageEvent, PageRecorder, RecorderConfig, RecorderController,
    RecorderEvent,
};

fn page(id: &str) -> PageId {
    PageId::from(id)
}

fn opened(id: &str, url: &str) -> RecorderEvent {
    RecorderEvent::PageOpened {
        page: page(id),
        url: url.into(),
        opener: None,
    }
}

fn click_on(id: &str, selector: &str, click_count: u32) -> RecorderEvent {
    RecorderEvent::PerformAction {
        page: page(id),
        frame: FrameRef::main("https://example.com/"),
        action: Action::Click {
            selector: selector.into(),
            button: MouseButton::Left,
            modifiers: Modifiers::empty(),
            click_count,
        },
    }
}

fn navigated(id: &str, url: &str) -> RecorderEvent {
    RecorderEvent::FrameNavigated {
        page: page(id),
        frame: FrameRef::main(url),
    }
}

fn quiet_config() -> RecorderConfig {
    RecorderConfig {
        echo: false,
        ..RecorderConfig::default()
    }
}

async fn record(events: Vec<RecorderEvent>) -> (String, DryRunBrowser) {
    let browser = DryRunBrowser::new();
    let output = MemoryOutput::new();
    replay(&quiet_config(), events, Arc::new(browser.clone()), output.clone())
        .await
        .unwrap();
    (output.text(), browser)
}

#[tokio::test]
async fn navigation_during_click_becomes_assertion() {
    let (script, browser) = record(vec![
        opened("p1", "about:blank"),
        click_on("p1", "#go", 1),
        navigated("p1", "https://example.com/next"),
        RecorderEvent::ContextClosed,
    ])
    .await;

    assert!(script.contains("const page = await context.newPage();"));
    assert!(!script.contains("goto('about:blank')"));
    assert!(script.contains("  // Click #go\n  await page.click('#go');\n  // assert.equal(page.url(), 'https://example.com/next');"));
    assert!(!script.contains("Promise.all"));
    assert!(browser.calls().contains(&"click(#go, left, 1)".to_string()));
}

#[tokio::test]
async fn late_navigation_wraps_the_click() {
    let (script, _) = record(vec![
        opened("p1", "about:blank"),
        click_on("p1", "#go", 1),
        RecorderEvent::Idle,
        navigated("p1", "https://example.com/next"),
    ])
    .await;

    assert!(script.contains("await Promise.all(["));
    assert!(script.contains("page.waitForNavigation(/*{ url: 'https://example.com/next' }*/),"));
    assert!(!script.contains("assert.equal"));
    assert_eq!(script.matches("// Click #go").count(), 1);
}

#[tokio::test]
async fn navigation_without_action_is_standalone_goto() {
    let (script, _) = record(vec![
        opened("p1", "about:blank"),
        navigated("p1", "https://example.com/"),
        navigated("p1", "https://example.com/"),
        RecorderEvent::ContextClosed,
    ])
    .await;

    assert_eq!(script.matches("await page.goto('https://example.com/');").count(), 1);
}

#[tokio::test]
async fn child_frame_navigation_is_ignored() {
    let (script, _) = record(vec![
        opened("p1", "about:blank"),
        RecorderEvent::FrameNavigated {
            page: page("p1"),
            frame: FrameRef::child("https://ads.example.com/", None),
        },
        RecorderEvent::ContextClosed,
    ])
    .await;
    assert!(!script.contains("ads.example.com"));
}

#[tokio::test]
async fn popup_uses_promise_all() {
    let (script, _) = record(vec![
        opened("p1", "https://example.com/"),
        click_on("p1", "text=\"Open\"", 1),
        RecorderEvent::PageOpened {
            page: page("p2"),
            url: "https://example.com/popup".into(),
            opener: Some(page("p1")),
        },
        RecorderEvent::Popup {
            page: page("p1"),
            popup: page("p2"),
        },
        RecorderEvent::ContextClosed,
    ])
    .await;

    assert!(script.contains("const [popup1] = await Promise.all(["));
    assert!(script.contains("page.waitForEvent('popup'),"));
    // The popup is not opened by the script itself.
    assert_eq!(script.matches("context.newPage()").count(), 1);
}

#[tokio::test]
async fn dialog_installs_dismiss_handler() {
    let (script, _) = record(vec![
        opened("p1", "https://example.com/"),
        click_on("p1", "#delete", 1),
        RecorderEvent::Dialog { page: page("p1") },
        RecorderEvent::ContextClosed,
    ])
    .await;
    assert!(script.contains("page.once('dialog', dialog => {"));
    assert!(script.contains("dialog.dismiss().catch(() => {});"));
}

#[tokio::test]
async fn download_after_click() {
    let (script, _) = record(vec![
        opened("p1", "https://example.com/"),
        click_on("p1", "#export", 1),
        RecorderEvent::Idle,
        RecorderEvent::Download { page: page("p1") },
        RecorderEvent::ContextClosed,
    ])
    .await;
    assert!(script.contains("const [download] = await Promise.all(["));
    assert!(script.contains("page.waitForEvent('download'),"));
}

#[tokio::test]
async fn later_pages_get_popup_aliases_and_close() {
    let (script, _) = record(vec![
        opened("p1", "https://example.com/"),
        opened("p2", "https://example.com/two"),
        RecorderEvent::PageClosed { page: page("p2") },
        opened("p3", "chrome://newtab/"),
        RecorderEvent::ContextClosed,
    ])
    .await;

    assert!(script.contains("const popup1 = await context.newPage();"));
    assert!(script.contains("await popup1.goto('https://example.com/two');"));
    assert!(script.contains("  // Close page\n  await popup1.close();"));
    assert!(script.contains("const popup2 = await context.newPage();"));
    assert!(!script.contains("chrome://newtab/"));
}

#[tokio::test]
async fn stale_target_is_still_recorded() {
    let browser = DryRunBrowser::new();
    browser.fail_selector("#gone");
    browser.fail_binding("commitLastAction");
    let output = MemoryOutput::new();
    let (_, stats) = replay(
        &quiet_config(),
        vec![opened("p1", "https://example.com/"), click_on("p1", "#gone", 1)],
        Arc::new(browser.clone()),
        output.clone(),
    )
    .await
    .unwrap();

    assert_eq!(stats.performed, 1);
    assert!(output.text().contains("await page.click('#gone');"));
    assert_eq!(
        browser.calls()[..3],
        [
            "exposeBinding(performPlaywrightAction)".to_string(),
            "exposeBinding(recordPlaywrightAction)".to_string(),
            "exposeBinding(commitLastAction)".to_string(),
        ]
    );
}

fn controller_with_memory(
    browser: DryRunBrowser,
) -> (RecorderController<MemoryOutput>, soulbrowser_recorder::ControllerHandle, MemoryOutput) {
    let output = MemoryOutput::new();
    let config = quiet_config();
    let generator = CodeGenerator::new(config.script_header(), Language::Javascript.generator(), output.clone());
    let (controller, handle) =
        RecorderController::new(generator, Arc::new(browser), Duration::from_secs(5));
    (controller, handle, output)
}

#[tokio::test(start_paused = true)]
async fn commit_timer_stops_click_upgrade() {
    let (controller, handle, output) = controller_with_memory(DryRunBrowser::new());
    let task = tokio::spawn(controller.run());

    handle.send(opened("p1", "https://example.com/")).await.unwrap();
    handle.send(click_on("p1", "#b", 1)).await.unwrap();
    handle.send(RecorderEvent::Idle).await.unwrap();
    tokio::time::sleep(Duration::from_secs(6)).await;
    handle.send(click_on("p1", "#b", 2)).await.unwrap();
    handle.send(RecorderEvent::Idle).await.unwrap();
    handle.send(RecorderEvent::ContextClosed).await.unwrap();
    task.await.unwrap().unwrap();

    let script = output.text();
    assert_eq!(script.matches("// Click #b").count(), 1);
    assert_eq!(script.matches("// Double click #b").count(), 1);
}

#[tokio::test]
async fn quick_second_click_upgrades_to_double_click() {
    let (controller, handle, output) = controller_with_memory(DryRunBrowser::new());
    let task = tokio::spawn(controller.run());

    handle.send(opened("p1", "https://example.com/")).await.unwrap();
    handle.send(click_on("p1", "#b", 1)).await.unwrap();
    handle.send(RecorderEvent::Idle).await.unwrap();
    handle.send(click_on("p1", "#b", 2)).await.unwrap();
    handle.send(RecorderEvent::Idle).await.unwrap();
    handle.send(RecorderEvent::ContextClosed).await.unwrap();
    task.await.unwrap().unwrap();

    let script = output.text();
    assert_eq!(script.matches("// Click #b").count(), 0);
    assert!(script.contains("await page.dblclick('#b');"));
}

#[tokio::test]
async fn aliases_are_assigned_on_first_sight() {
    let (mut controller, _handle, _) = controller_with_memory(DryRunBrowser::new());
    controller.handle_event(opened("p1", "about:blank")).await.unwrap();
    controller
        .handle_event(RecorderEvent::Popup {
            page: page("p1"),
            popup: page("p9"),
        })
        .await
        .unwrap();
    assert_eq!(controller.page_alias(&page("p1")), Some("page"));
    assert_eq!(controller.page_alias(&page("p9")), Some("popup1"));
    assert_eq!(controller.pending_timers(), 0);
}

#[tokio::test]
async fn dropping_every_handle_closes_and_flushes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("script.js");
    let config = quiet_config();
    let generator = CodeGenerator::new(
        config.script_header(),
        Language::Javascript.generator(),
        FileOutput::new(path.clone()),
    );
    let (controller, handle) = RecorderController::new(
        generator,
        Arc::new(DryRunBrowser::new()),
        Duration::from_secs(5),
    );
    let task = tokio::spawn(controller.run());

    handle.send(opened("p1", "https://example.com/")).await.unwrap();
    handle.send(click_on("p1", "#b", 1)).await.unwrap();
    let second = handle.clone();
    drop(handle);
    second.send(RecorderEvent::CommitLastAction).await.unwrap();
    drop(second);

    let output = tokio::time::timeout(Duration::from_secs(60), task)
        .await
        .expect("controller exits once its handles are gone")
        .unwrap()
        .unwrap();
    assert_eq!(output.path(), path.as_path());

    let script = std::fs::read_to_string(&path).unwrap();
    assert!(script.contains("await page.click('#b');"));
    assert!(script.trim_end().ends_with("})();"));
}

#[tokio::test]
async fn page_recorder_feeds_the_controller() {
    let browser = DryRunBrowser::new();
    let (controller, handle, output) = controller_with_memory(browser.clone());
    let task = tokio::spawn(controller.run());

    let snapshot = DomSnapshot::parse("<main><button>Save</button></main>");
    let button = snapshot.query_first("button").unwrap().unwrap();
    let mut recorder = PageRecorder::new(snapshot.clone());
    let p1 = page("p1");
    let frame = FrameRef::main("https://example.com/");

    handle.send(opened("p1", "https://example.com/")).await.unwrap();
    let hover = PageEvent::MouseMove {
        target: Some(button.clone()),
    };
    assert!(!recorder.forward(hover, &p1, &frame, &handle).await.unwrap());
    let click = PageEvent::Click {
        target: button,
        which: 1,
        modifiers: Modifiers::empty(),
        detail: 1,
    };
    assert!(recorder.forward(click, &p1, &frame, &handle).await.unwrap());
    handle.send(RecorderEvent::Idle).await.unwrap();
    recorder.action_performed();
    drop(handle);

    let output_after = task.await.unwrap().unwrap();
    assert_eq!(output_after.text(), output.text());
    assert!(output.text().contains("await page.click('text=\"Save\"');"));
    assert!(browser
        .calls()
        .contains(&"click(text=\"Save\", left, 1)".to_string()));
}
