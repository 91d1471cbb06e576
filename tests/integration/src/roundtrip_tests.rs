//! Save output stability: loading and saving an unchanged tree reproduces
//! the input, and repeated saves agree with each other

mod schemas;

use filemodel_core::{LoadOptions, ModelArena, SaveOptions, load, save, save_as};
use filemodel_test_utils::TestTree;
use pretty_assertions::assert_eq;
use schemas::{Block, Model};
use serde_json::json;
use std::path::PathBuf;

const FILES: [&str; 5] = [
    "m/root.json",
    "m/sub/child.json",
    "m/blocks/a.json",
    "m/blocks/b.json",
    "m/shared/leaf.json",
];

fn sample_tree() -> TestTree {
    let tree = TestTree::new();
    tree.write_json(
        "m/root.json",
        &json!({
            "name": "sample",
            "child": "sub/child.json",
            "children": ["blocks/a.json", "blocks/b.json"],
        }),
    );
    tree.write_json("m/sub/child.json", &json!({ "label": "child", "value": 1 }));
    tree.write_json("m/blocks/a.json", &json!({ "value": 2, "nested": "../shared/leaf.json" }));
    tree.write_json("m/blocks/b.json", &json!({ "value": 3, "nested": "../shared/leaf.json" }));
    tree.write_json("m/shared/leaf.json", &json!({ "label": "leaf" }));
    tree
}

fn snapshot(tree: &TestTree, files: &[&str]) -> Vec<String> {
    files.iter().map(|file| tree.read_file(file)).collect()
}

#[test]
fn test_load_then_save_reproduces_every_file() {
    let tree = sample_tree();
    let before = snapshot(&tree, &FILES);
    let mut models = ModelArena::new();
    let root = load::<Model>(&mut models, tree.path("m/root.json"), &LoadOptions::default()).unwrap();

    save(&mut models, root, &SaveOptions::default().recurse(true)).unwrap();

    assert_eq!(snapshot(&tree, &FILES), before);
}

#[test]
fn test_relocated_copy_matches_original_byte_for_byte() {
    let tree = sample_tree();
    let mut models = ModelArena::new();
    let root = load::<Model>(&mut models, tree.path("m/root.json"), &LoadOptions::default()).unwrap();

    save_as(&mut models, root, tree.path("copy/root.json"), &SaveOptions::default().recurse(true))
        .unwrap();

    let copied: Vec<String> = FILES.iter().map(|f| f.replacen("m/", "copy/", 1)).collect();
    let copied: Vec<&str> = copied.iter().map(String::as_str).collect();
    assert_eq!(snapshot(&tree, &copied), snapshot(&tree, &FILES));
}

#[test]
fn test_toml_tree_round_trips() {
    let tree = TestTree::new();
    tree.write_file("m/root.toml", "child = \"child.toml\"\nname = \"t\"\n");
    tree.write_file("m/child.toml", "label = \"c\"\nvalue = 5\n");
    let before = snapshot(&tree, &["m/root.toml", "m/child.toml"]);
    let mut models = ModelArena::new();
    let root = load::<Model>(&mut models, tree.path("m/root.toml"), &LoadOptions::default()).unwrap();

    save(&mut models, root, &SaveOptions::default().recurse(true)).unwrap();

    assert_eq!(snapshot(&tree, &["m/root.toml", "m/child.toml"]), before);
}

#[test]
fn test_saving_twice_generates_the_same_names() {
    let tree = TestTree::new();
    tree.write_json("m/root.json", &json!({ "name": "root" }));
    let mut models = ModelArena::new();
    let root = load::<Model>(&mut models, tree.path("m/root.json"), &LoadOptions::default()).unwrap();
    let first = models.insert(Block::labeled("first", 1));
    let second = models.insert(Block::labeled("second", 2));
    models.typed_mut::<Model>(root).unwrap().children = vec![first, second];
    let options = SaveOptions::default().recurse(true);
    let files = ["m/root.json", "m/first.json", "m/second.json"];

    save(&mut models, root, &options).unwrap();
    let names: Vec<_> = [first, second]
        .iter()
        .map(|&id| models.file(id).unwrap().base().filepath.clone())
        .collect();
    let output = snapshot(&tree, &files);

    save(&mut models, root, &options).unwrap();

    let names_again: Vec<_> = [first, second]
        .iter()
        .map(|&id| models.file(id).unwrap().base().filepath.clone())
        .collect();
    assert_eq!(names_again, names);
    assert_eq!(
        names,
        vec![Some(PathBuf::from("first.json")), Some(PathBuf::from("second.json"))]
    );
    assert_eq!(snapshot(&tree, &files), output);
    assert_eq!(
        tree.read_json("m/root.json"),
        json!({ "name": "root", "children": ["first.json", "second.json"] })
    );
}

#[test]
fn test_shared_leaf_is_written_once_per_save() {
    let tree = sample_tree();
    let mut models = ModelArena::new();
    let root = load::<Model>(&mut models, tree.path("m/root.json"), &LoadOptions::default()).unwrap();
    let children = models.typed::<Model>(root).unwrap().children.clone();
    let leaves: Vec<_> = children
        .iter()
        .map(|&id| models.typed::<Block>(id).unwrap().nested.unwrap())
        .collect();
    assert_eq!(leaves[0], leaves[1]);

    models.typed_mut::<Block>(leaves[0]).unwrap().value = Some(42);
    save(&mut models, root, &SaveOptions::default().recurse(true)).unwrap();

    assert_eq!(
        tree.read_json("m/shared/leaf.json"),
        json!({ "label": "leaf", "value": 42 })
    );
}

#[test]
fn test_shared_leaf_keeps_each_parents_reference() {
    let tree = TestTree::new();
    tree.write_json(
        "m/root.json",
        &json!({ "child": "sub/a.json", "children": ["sub/leaf.json"] }),
    );
    tree.write_json("m/sub/a.json", &json!({ "nested": "leaf.json" }));
    tree.write_json("m/sub/leaf.json", &json!({ "label": "leaf" }));
    let files = ["m/root.json", "m/sub/a.json", "m/sub/leaf.json"];
    let before = snapshot(&tree, &files);
    let mut models = ModelArena::new();
    let root = load::<Model>(&mut models, tree.path("m/root.json"), &LoadOptions::default()).unwrap();

    save(&mut models, root, &SaveOptions::default().recurse(true)).unwrap();
    assert_eq!(snapshot(&tree, &files), before);

    save_as(&mut models, root, tree.path("copy/root.json"), &SaveOptions::default().recurse(true))
        .unwrap();
    assert_eq!(
        tree.read_json("copy/root.json"),
        json!({ "child": "sub/a.json", "children": ["sub/leaf.json"] })
    );
    assert_eq!(tree.read_json("copy/sub/a.json"), json!({ "nested": "leaf.json" }));
    tree.assert_file_exists("copy/sub/leaf.json");
}
