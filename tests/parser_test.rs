// Parsing behavior checked against whole files through the public API.
use tscn_core::{parse, Dictionary, Parser, ResourceKind, Value, Vector2, Vector3};
use std::fs;
use std::path::PathBuf;

fn read_fixture(filename: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(filename);
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to read test file: {path:?}"))
}

mod scenes {
    use super::*;

    #[test]
    fn test_player_scene_structure() {
        let doc = parse(&read_fixture("player.tscn"));

        assert_eq!(doc.header.kind, ResourceKind::Scene);
        assert_eq!(doc.header.load_steps, Some(4));
        assert_eq!(doc.header.format, 3);
        assert_eq!(doc.header.uid.as_deref(), Some("uid://b8x1y2z3w4v5"));

        assert_eq!(doc.ext_resources.len(), 2);
        assert_eq!(doc.ext_resources[0].uid.as_deref(), Some("uid://c1a2b3d4e5f6"));
        assert_eq!(doc.ext_resources[1].uid, None);
        assert_eq!(doc.sub_resources[0].id, "RectangleShape2D_abcde");
        assert_eq!(
            doc.sub_resources[0].properties.get("size"),
            Some(&Value::Vector2(Vector2::new(32.0, 48.0)))
        );

        let names: Vec<&str> = doc.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Player", "Sprite2D", "CollisionShape2D", "Hurtbox", "Shape", "Camera2D"]
        );
        let player = &doc.nodes[0];
        assert!(player.is_root());
        assert_eq!(player.groups, vec!["players", "damageable"]);
        assert_eq!(player.properties.get("speed"), Some(&Value::Float(300.0)));
        assert_eq!(player.properties.get("max_health"), Some(&Value::Int(100)));
        assert_eq!(
            player.properties.get("script"),
            Some(&Value::ExtResource("1_k3j4h".to_string()))
        );

        assert_eq!(doc.connections.len(), 1);
        assert_eq!(doc.connections[0].from, "Hurtbox");
        assert_eq!(doc.connections[0].to, ".");
    }

    #[test]
    fn test_menu_scene_instances_and_literals() {
        let doc = parse(&read_fixture("menu.tscn"));

        let title = doc.find_node("Title").unwrap();
        assert_eq!(
            title.properties.get("text"),
            Some(&Value::String("Main \"Menu\"\nsecond line".to_string()))
        );

        let quit = doc.find_node("Buttons/Quit").unwrap();
        assert_eq!(quit.node_type, None);
        assert_eq!(quit.index, Some(1));
        assert_eq!(quit.instance, Some(Value::ExtResource("1_btn".to_string())));

        let anim = doc.find_node("Anim").unwrap();
        assert_eq!(
            anim.properties.get("autoplay"),
            Some(&Value::Opaque("&\"intro\"".to_string()))
        );
        assert_eq!(
            anim.properties.get("rect"),
            Some(&Value::Opaque("Rect2(0, 0, 64, 32)".to_string()))
        );
        let libraries = anim.properties.get("libraries").and_then(Value::as_dictionary);
        assert_eq!(libraries.map(Dictionary::len), Some(1));

        let quit_connection = &doc.connections[1];
        assert_eq!(quit_connection.flags, Some(3));
        assert_eq!(
            quit_connection.binds,
            Some(vec![Value::Int(1), Value::from("quit")])
        );
        assert_eq!(doc.editable_instances, vec!["Buttons/Start"]);
    }
}

mod resources {
    use super::*;

    #[test]
    fn test_weapon_resource() {
        let doc = parse(&read_fixture("weapon.tres"));

        assert_eq!(doc.header.kind, ResourceKind::Resource);
        assert_eq!(doc.header.resource_type.as_deref(), Some("Resource"));
        assert_eq!(doc.header.script_class.as_deref(), Some("WeaponStats"));
        assert!(doc.nodes.is_empty());
        assert_eq!(doc.sub_resources.len(), 2);

        let resource = doc.resource.as_ref().expect("main resource block");
        assert_eq!(resource.get("damage"), Some(&Value::Int(12)));
        assert_eq!(resource.get("crit_chance"), Some(&Value::Float(2e-05)));
        assert_eq!(resource.get("max_range"), Some(&Value::Float(f64::INFINITY)));
        assert_eq!(
            resource.get("knockback"),
            Some(&Value::Vector3(Vector3::new(0.0, 0.5, -1.0)))
        );
        assert_eq!(
            resource.get("target"),
            Some(&Value::NodePath("../Enemy".to_string()))
        );

        let bonus = resource.get("bonus").and_then(Value::as_dictionary).unwrap();
        assert_eq!(bonus.get("strength"), Some(&Value::Int(2)));
        assert_eq!(bonus.get("agility"), Some(&Value::Int(1)));

        let curve = &doc.sub_resources[0].properties;
        let data = curve.get("_data").and_then(Value::as_array).unwrap();
        assert_eq!(data.len(), 10);
        assert_eq!(data[0], Value::Vector2(Vector2::new(0.0, 0.0)));
    }
}

mod leniency {
    use super::*;

    #[test]
    fn test_missing_header_gets_defaults() {
        let doc = parse("[node name=\"Root\" type=\"Node\"]\n");
        assert_eq!(doc.header.kind, ResourceKind::Scene);
        assert_eq!(doc.header.format, 3);
        assert_eq!(doc.header.load_steps, None);
        assert_eq!(doc.nodes.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        let doc = parse("");
        assert!(doc.nodes.is_empty());
        assert_eq!(doc.header.format, 3);
    }

    #[test]
    fn test_crlf_and_comments() {
        let source = "; saved by hand\r\n[gd_scene format=3]\r\n\r\n[node name=\"A\" type=\"Node\"]\r\n; note\r\nx = 1\r\n";
        let doc = parse(source);
        assert_eq!(doc.nodes[0].properties.get("x"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_skipped_lines_are_reported() {
        let source = "[gd_scene format=3]\ngarbage\n\n[node name=\"A\"]\nnot a property\nok = true\n\n[future_section a=1]\nkey = 2\n";
        let mut parser = Parser::new(source);
        let doc = parser.parse_document();

        assert_eq!(doc.nodes.len(), 1);
        assert_eq!(doc.nodes[0].properties.len(), 1);
        assert_eq!(parser.warnings().len(), 3);
    }

    #[test]
    fn test_unknown_section_body_is_not_attached_to_previous_node() {
        let source = "[node name=\"A\"]\na = 1\n\n[mystery]\nb = 2\n";
        let doc = parse(source);
        assert_eq!(doc.nodes[0].properties.len(), 1);
        assert!(!doc.nodes[0].properties.contains_key("b"));
    }
}
