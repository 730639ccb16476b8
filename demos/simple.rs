use tscn_core::{analyze, Node, NodeUpdate, Properties, Value, Vector2};

fn main() {
    let scene = r#"[gd_scene load_steps=2 format=3]

[ext_resource type="Script" path="res://player.gd" id="1_abc"]

[node name="Main" type="Node2D"]

[node name="Player" type="CharacterBody2D" parent="."]
script = ExtResource("1_abc")
position = Vector2(100, 200)

[node name="Sprite" type="Sprite2D" parent="Player"]

[connection signal="ready" from="Player" to="." method="_on_player_ready"]
"#;

    let mut analysis = analyze(scene, "main.tscn");
    for warning in &analysis.warnings {
        eprintln!("{:?}", miette::Report::new(warning.clone()));
    }

    let doc = &mut analysis.document;
    doc.add_node(
        Node::new("Enemy")
            .with_type("Area2D")
            .with_parent(".")
            .with_property("position", Vector2::new(400.0, 200.0)),
    );

    let mut properties = Properties::new();
    properties.insert("speed".to_string(), Value::Int(300));
    doc.modify_node(
        "Player",
        NodeUpdate {
            properties: Some(properties),
            ..NodeUpdate::default()
        },
    );

    match analysis.tree_json() {
        Ok(tree) => println!("Scene tree:\n{tree}\n"),
        Err(e) => eprintln!("Failed to render tree: {e:?}"),
    }
    println!("Rewritten scene:\n{}", analysis.to_tscn());
}
