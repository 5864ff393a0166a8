//! End-to-end discovery scenarios driven by the scripted browser double —
//! no real browser involved.

use graphscout::browser::mock::{ScriptedBrowser, ScriptedPage};
use graphscout::config::ExplorerConfig;
use graphscout::{Explorer, EventSink, Status};
use serde_json::json;
use std::collections::HashMap;

fn elements_script_response(elements: serde_json::Value) -> (String, serde_json::Value) {
    ("querySelectorAll".to_string(), elements)
}

fn link_element(text: &str, href: &str, css_path: &str) -> serde_json::Value {
    json!({
        "kind": "link",
        "text": text,
        "href": href,
        "ariaLabel": null,
        "testId": null,
        "cssPath": css_path,
        "x": 10.0,
        "y": 10.0,
        "w": 40.0,
        "h": 20.0,
    })
}

fn button_element(text: &str, css_path: &str) -> serde_json::Value {
    json!({
        "kind": "button",
        "text": text,
        "href": null,
        "ariaLabel": null,
        "testId": null,
        "cssPath": css_path,
        "x": 20.0,
        "y": 20.0,
        "w": 40.0,
        "h": 20.0,
    })
}

#[tokio::test]
async fn follows_same_host_links_and_stops_at_max_depth() {
    let home = ScriptedPage {
        url: "https://example.test/".to_string(),
        title: "Home".to_string(),
        evaluate_responses: HashMap::from([elements_script_response(json!([
            link_element("About", "/about", "a.about"),
        ]))]),
        click_targets: HashMap::new(),
    };
    let about = ScriptedPage {
        url: "https://example.test/about".to_string(),
        title: "About".to_string(),
        evaluate_responses: HashMap::from([elements_script_response(json!([]))]),
        click_targets: HashMap::new(),
    };

    let browser = ScriptedBrowser::new(vec![home, about]);
    let mut config = ExplorerConfig::new("depth app", "https://example.test/");
    config.max_depth = 1;

    let explorer = Explorer::new(config, EventSink::default()).unwrap();
    let report = explorer.discover(&browser).await;

    assert_eq!(report.status, Status::Complete);
    assert_eq!(report.nodes_discovered, 2);
    assert_eq!(report.edges_discovered, 1);
}

#[tokio::test]
async fn skips_out_of_scope_links() {
    let home = ScriptedPage {
        url: "https://example.test/".to_string(),
        title: "Home".to_string(),
        evaluate_responses: HashMap::from([elements_script_response(json!([
            link_element("External", "https://other.test/", "a.ext"),
        ]))]),
        click_targets: HashMap::new(),
    };

    let browser = ScriptedBrowser::new(vec![home]);
    let config = ExplorerConfig::new("scope app", "https://example.test/");
    let explorer = Explorer::new(config, EventSink::default()).unwrap();
    let report = explorer.discover(&browser).await;

    assert_eq!(report.nodes_discovered, 1);
    assert_eq!(report.edges_discovered, 0);
}

#[tokio::test]
async fn destructive_elements_never_appear_in_extracted_nodes() {
    let home = ScriptedPage {
        url: "https://example.test/".to_string(),
        title: "Home".to_string(),
        evaluate_responses: HashMap::from([elements_script_response(json!([
            button_element("Log Out", "button.logout"),
            button_element("Settings", "button.settings"),
        ]))]),
        click_targets: HashMap::from([("button.settings".to_string(), None)]),
    };

    let browser = ScriptedBrowser::new(vec![home]);
    let config = ExplorerConfig::new("danger app", "https://example.test/");
    let explorer = Explorer::new(config, EventSink::default()).unwrap();
    let report = explorer.discover(&browser).await;

    let home_node = report
        .graph
        .nodes
        .values()
        .find(|n| n.normalized_url == "https://example.test")
        .expect("home node present");
    assert!(home_node.elements.iter().all(|e| e.text != "Log Out"));
    assert!(home_node.elements.iter().any(|e| e.text == "Settings"));
}

#[tokio::test]
async fn re_discovered_url_still_gets_an_edge_from_its_second_source() {
    // A -> {B, C}, B -> C. C is dequeued once via A (and visited), then
    // again via B after it's already visited — that second dequeue must
    // still close an edge B -> C rather than silently drop it.
    let a = ScriptedPage {
        url: "https://example.test/".to_string(),
        title: "A".to_string(),
        evaluate_responses: HashMap::from([elements_script_response(json!([
            link_element("B", "/b", "a.b"),
            link_element("C", "/c", "a.c"),
        ]))]),
        click_targets: HashMap::new(),
    };
    let b = ScriptedPage {
        url: "https://example.test/b".to_string(),
        title: "B".to_string(),
        evaluate_responses: HashMap::from([elements_script_response(json!([
            link_element("C", "/c", "a.c"),
        ]))]),
        click_targets: HashMap::new(),
    };
    let c = ScriptedPage {
        url: "https://example.test/c".to_string(),
        title: "C".to_string(),
        evaluate_responses: HashMap::from([elements_script_response(json!([]))]),
        click_targets: HashMap::new(),
    };

    let browser = ScriptedBrowser::new(vec![a, b, c]);
    let config = ExplorerConfig::new("redisco app", "https://example.test/");
    let explorer = Explorer::new(config, EventSink::default()).unwrap();
    let report = explorer.discover(&browser).await;

    assert_eq!(report.nodes_discovered, 3);
    assert_eq!(report.edges_discovered, 3);

    let c_node = report
        .graph
        .nodes
        .values()
        .find(|n| n.normalized_url == "https://example.test/c")
        .expect("C node present");
    let b_node = report
        .graph
        .nodes
        .values()
        .find(|n| n.normalized_url == "https://example.test/b")
        .expect("B node present");
    assert!(
        report
            .graph
            .edges
            .iter()
            .any(|e| e.source_id == b_node.id && e.target_id == c_node.id),
        "expected an edge from B to C to be recorded on re-discovery"
    );
}

#[tokio::test]
async fn reports_are_json_serializable() {
    let home = ScriptedPage {
        url: "https://example.test/".to_string(),
        title: "Home".to_string(),
        evaluate_responses: HashMap::from([elements_script_response(json!([]))]),
        click_targets: HashMap::new(),
    };
    let browser = ScriptedBrowser::new(vec![home]);
    let config = ExplorerConfig::new("json app", "https://example.test/");
    let explorer = Explorer::new(config, EventSink::default()).unwrap();
    let report = explorer.discover(&browser).await;

    let serialized = serde_json::to_string(&report).expect("report serializes");
    assert!(serialized.contains("\"status\""));
}
