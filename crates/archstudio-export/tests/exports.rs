use archstudio_core::{
    ConnectionDetails, ConnectionKind, Diagram, ElementKind, ElementPatch, IdGenerator,
};
use archstudio_export::{export, json, save, ExportFormat, ExportOptions};
use archstudio_geometry::{Point, Size};
use proptest::prelude::*;
use proptest::test_runner::Config;

fn scenario() -> Diagram {
    let mut diagram = Diagram::with_id_generator(IdGenerator::sequential());
    let web = diagram.add_element(ElementKind::WebApp, "Storefront", Point::new(100.0, 100.0));
    let db = diagram.add_element(ElementKind::Database, "Orders", Point::new(400.0, 100.0));
    diagram
        .add_connection(web.id, db.id, ConnectionDetails::new("REST", ConnectionKind::Sync))
        .unwrap();
    diagram
}

#[test]
fn scenario_edge_line() {
    let text = export(ExportFormat::Mermaid, &scenario(), ExportOptions::default()).unwrap();
    let edges: Vec<&str> = text.lines().filter(|l| l.contains("-->")).collect();
    assert_eq!(edges, vec!["    1 -->|REST| 2"]);
}

#[test]
fn svg_save_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("diagram.svg");
    save(&path, ExportFormat::Svg, &scenario(), ExportOptions::default()).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("<svg"));
    assert!(written.contains("Storefront"));
}

#[test]
fn save_into_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope").join("diagram.json");
    assert!(save(&path, ExportFormat::Json, &scenario(), ExportOptions::default()).is_err());
}

#[test]
fn json_dump_reloads_into_equal_diagram() {
    let mut diagram = scenario();
    let group = diagram.add_group("Shop", "#10b981", None, Point::ORIGIN, Size::new(700.0, 300.0));
    let first = diagram.elements().next().unwrap().id;
    diagram.assign_element_to_group(first, Some(group.id)).unwrap();

    let text = export(ExportFormat::Json, &diagram, ExportOptions { include_groups: true }).unwrap();
    let reloaded = Diagram::from_snapshot(json::parse(&text).unwrap().into_snapshot());

    assert_eq!(reloaded.snapshot(), diagram.snapshot());
}

fn kind_strategy() -> impl Strategy<Value = ConnectionKind> {
    prop_oneof![
        Just(ConnectionKind::Sync),
        Just(ConnectionKind::Async),
        Just(ConnectionKind::Data),
    ]
}

proptest! {
    #![proptest_config(Config::with_cases(64))]

    #[test]
    fn exports_are_idempotent(
        names in prop::collection::vec(("[A-Za-z \"<&]{1,12}", proptest::option::of("[A-Za-z0-9 ]{0,10}")), 1..6),
        edges in prop::collection::vec((0_usize..6, 0_usize..6, "[A-Z]{0,6}", kind_strategy()), 0..10),
    ) {
        let mut diagram = Diagram::with_id_generator(IdGenerator::sequential());
        let ids: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(i, (name, tech))| {
                let id = diagram
                    .add_element(ElementKind::ALL[i % ElementKind::ALL.len()], name.clone(), Point::new(i as f64 * 180.0, 60.0))
                    .id;
                if let Some(tech) = tech {
                    diagram.update_element(id, ElementPatch::default().tech_stack(tech.clone())).unwrap();
                }
                id
            })
            .collect();
        for (from, to, protocol, kind) in edges {
            diagram
                .add_connection(ids[from % ids.len()], ids[to % ids.len()], ConnectionDetails::new(protocol, kind))
                .unwrap();
        }

        for format in ExportFormat::ALL {
            let first = export(format, &diagram, ExportOptions::default()).unwrap();
            let second = export(format, &diagram, ExportOptions::default()).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
