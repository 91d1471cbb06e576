//! End-to-end scenarios for loading, caching and relocating model trees

mod schemas;

use filemodel_core::{
    EngineConfig, Error, LoadContext, LoadOptions, ModelArena, PathResolver, SaveOptions, load,
    load_with, new_model, save, save_as, save_with,
};
use filemodel_test_utils::TestTree;
use pretty_assertions::assert_eq;
use schemas::{Block, Model, block_reads, reset_block_reads};
use serde_json::json;
use std::path::PathBuf;

fn context(tree: &TestTree) -> LoadContext {
    LoadContext::new().with_resolver(PathResolver::with_root(tree.root()))
}

fn recursive() -> SaveOptions {
    SaveOptions::default().recurse(true)
}

#[test]
fn test_identity_within_one_context() {
    let tree = TestTree::new();
    tree.write_json("m/root.json", &json!({ "child": "sub/child.json" }));
    tree.write_json("m/sub/child.json", &json!({ "value": 1 }));
    let mut ctx = context(&tree);
    let mut models = ModelArena::new();
    let options = LoadOptions::default();

    let a = load_with::<Model>(&mut ctx, &mut models, "m/root.json", &options).unwrap();
    let b = load_with::<Model>(&mut ctx, &mut models, "m/root.json", &options).unwrap();
    let child = load_with::<Block>(&mut ctx, &mut models, "m/sub/child.json", &options).unwrap();

    assert_eq!(a, b);
    assert_eq!(models.typed::<Model>(a).unwrap().child, Some(child));
}

#[test]
fn test_modified_child_is_reloaded_with_new_content() {
    let tree = TestTree::new();
    tree.write_json("m/child.json", &json!({ "value": 1 }));
    let mut ctx = context(&tree);
    let mut models = ModelArena::new();
    let options = LoadOptions::default();

    let a = load_with::<Block>(&mut ctx, &mut models, "m/child.json", &options).unwrap();
    tree.write_json("m/child.json", &json!({ "value": 2 }));
    assert!(ctx.is_content_changed(&tree.path("m/child.json")));
    let b = load_with::<Block>(&mut ctx, &mut models, "m/child.json", &options).unwrap();

    assert_ne!(a, b);
    assert_eq!(models.typed::<Block>(a).unwrap().value, Some(1));
    assert_eq!(models.typed::<Block>(b).unwrap().value, Some(2));
}

#[test]
fn test_child_resolves_against_root_directory() {
    let tree = TestTree::new();
    tree.write_json("m/root.json", &json!({ "child": "sub/child.json" }));
    tree.write_json("m/sub/child.json", &json!({ "value": 7 }));
    let mut models = ModelArena::new();

    let root = load::<Model>(&mut models, tree.path("m/root.json"), &LoadOptions::default()).unwrap();

    let child = models.typed::<Model>(root).unwrap().child.unwrap();
    let base = models.file(child).unwrap().base();
    assert_eq!(base.filepath, Some(PathBuf::from("sub/child.json")));
    assert_eq!(base.resolved_path(), Some(tree.path("m/sub/child.json")));
}

#[test]
fn test_save_as_relocates_children_with_root() {
    let tree = TestTree::new();
    tree.write_json("m/root.json", &json!({ "child": "sub/child.json" }));
    tree.write_json("m/sub/child.json", &json!({ "value": 7 }));
    let mut models = ModelArena::new();
    let root = load::<Model>(&mut models, tree.path("m/root.json"), &LoadOptions::default()).unwrap();

    save_as(&mut models, root, tree.path("out/root.json"), &recursive()).unwrap();

    assert_eq!(tree.read_json("out/root.json"), json!({ "child": "sub/child.json" }));
    assert_eq!(tree.read_json("out/sub/child.json"), json!({ "value": 7 }));
    let child = models.typed::<Model>(root).unwrap().child.unwrap();
    assert_eq!(
        models.file(child).unwrap().base().absolute_anchor,
        Some(tree.path("out"))
    );
    // The originals are untouched
    assert_eq!(tree.read_json("m/sub/child.json"), json!({ "value": 7 }));
}

#[test]
fn test_anchored_tree_relocates_under_anchor() {
    let tree = TestTree::new();
    tree.write_json(
        "m/root.json",
        &json!({ "anchored": true, "children": ["blocks/a.json"] }),
    );
    tree.write_json("m/blocks/a.json", &json!({ "nested": "data/x.json" }));
    tree.write_json("m/data/x.json", &json!({ "value": 3 }));
    let mut models = ModelArena::new();
    let root = load::<Model>(&mut models, tree.path("m/root.json"), &LoadOptions::default()).unwrap();

    save_as(&mut models, root, tree.path("out/root.json"), &recursive()).unwrap();

    tree.assert_file_exists("out/blocks/a.json");
    tree.assert_file_exists("out/data/x.json");
    tree.assert_file_not_exists("out/blocks/data/x.json");
    assert_eq!(tree.read_json("out/blocks/a.json"), json!({ "nested": "data/x.json" }));
}

#[test]
fn test_new_child_gets_generated_name_on_recursive_save() {
    let tree = TestTree::new();
    tree.write_json("m/root.json", &json!({ "name": "root" }));
    let mut models = ModelArena::new();
    let root = load::<Model>(&mut models, tree.path("m/root.json"), &LoadOptions::default()).unwrap();
    let block = models.insert(Block::labeled("generated", 5));
    models.typed_mut::<Model>(root).unwrap().child = Some(block);

    save(&mut models, root, &recursive()).unwrap();

    let base = models.file(block).unwrap().base();
    assert_eq!(base.filepath, Some(PathBuf::from("generated.json")));
    assert_eq!(base.absolute_anchor, Some(tree.path("m")));
    assert_eq!(
        tree.read_json("m/generated.json"),
        json!({ "label": "generated", "value": 5 })
    );
    assert_eq!(
        tree.read_json("m/root.json"),
        json!({ "name": "root", "child": "generated.json" })
    );
}

#[test]
fn test_node_without_default_name_is_not_written() {
    let tree = TestTree::new();
    tree.write_json("m/root.json", &json!({}));
    let mut models = ModelArena::new();
    let root = load::<Model>(&mut models, tree.path("m/root.json"), &LoadOptions::default()).unwrap();
    let block = new_model::<Block>(&mut models);
    models.typed_mut::<Model>(root).unwrap().child = Some(block);

    save(&mut models, root, &recursive()).unwrap();

    assert_eq!(models.file(block).unwrap().base().filepath, None);
    assert_eq!(tree.read_json("m/root.json"), json!({}));
}

#[test]
fn test_toml_root_with_unnamed_child_saves_without_reference() {
    let tree = TestTree::new();
    tree.write_file("m/root.toml", "name = \"t\"\n");
    let mut models = ModelArena::new();
    let root = load::<Model>(&mut models, tree.path("m/root.toml"), &LoadOptions::default()).unwrap();
    let block = new_model::<Block>(&mut models);
    let named = models.insert(Block::labeled("kept", 1));
    let model = models.typed_mut::<Model>(root).unwrap();
    model.child = Some(block);
    model.children = vec![block, named];

    save(&mut models, root, &recursive()).unwrap();

    tree.assert_file_exists("m/kept.json");
    let mut reloaded = ModelArena::new();
    let again = load::<Model>(&mut reloaded, tree.path("m/root.toml"), &LoadOptions::default())
        .unwrap();
    let model = reloaded.typed::<Model>(again).unwrap();
    assert_eq!(model.name.as_deref(), Some("t"));
    assert_eq!(model.child, None);
    assert_eq!(model.children.len(), 1);
    let kept = reloaded.typed::<Block>(model.children[0]).unwrap();
    assert_eq!(kept.label.as_deref(), Some("kept"));
}

#[test]
fn test_repeated_reference_without_recurse_shares_one_stub() {
    let tree = TestTree::new();
    tree.write_json(
        "m/root.json",
        &json!({ "child": "a.json", "children": ["a.json", "sub/../a.json"] }),
    );
    tree.write_json("m/a.json", &json!({ "value": 1 }));
    let mut models = ModelArena::new();
    reset_block_reads();

    let root = load::<Model>(
        &mut models,
        tree.path("m/root.json"),
        &LoadOptions::default().recurse(false),
    )
    .unwrap();

    let model = models.typed::<Model>(root).unwrap();
    assert_eq!(model.child, Some(model.children[0]));
    assert_eq!(model.children[0], model.children[1]);
    let stub = model.children[0];
    models.typed_mut::<Block>(stub).unwrap().value = Some(2);
    let model = models.typed::<Model>(root).unwrap();
    assert_eq!(models.typed::<Block>(model.child.unwrap()).unwrap().value, Some(2));
    assert_eq!(block_reads(), 0);
}

#[test]
fn test_unrelated_cache_entry_leaves_new_root_as_stub() {
    let tree = TestTree::new();
    tree.write_json("other.json", &json!({ "value": 0 }));
    tree.write_json("m/root.json", &json!({ "child": "child.json" }));
    tree.write_json("m/child.json", &json!({ "value": 1 }));
    let mut ctx = context(&tree);
    let mut models = ModelArena::new();
    let options = LoadOptions::default().recurse(false);

    load_with::<Block>(&mut ctx, &mut models, "other.json", &options).unwrap();
    reset_block_reads();
    let root = load_with::<Model>(&mut ctx, &mut models, "m/root.json", &options).unwrap();

    let model = models.typed::<Model>(root).unwrap();
    assert_eq!(model.child, None);
    assert_eq!(model.base.filepath, Some(PathBuf::from("m/root.json")));
    assert_eq!(block_reads(), 0);
}

#[test]
fn test_children_are_stubs_without_recurse() {
    let tree = TestTree::new();
    tree.write_json(
        "m/root.json",
        &json!({ "child": "a.json", "children": ["b.json", "c.json"] }),
    );
    for name in ["a", "b", "c"] {
        tree.write_json(&format!("m/{name}.json"), &json!({ "value": 1 }));
    }
    let mut models = ModelArena::new();
    reset_block_reads();

    let root = load::<Model>(
        &mut models,
        tree.path("m/root.json"),
        &LoadOptions::default().recurse(false),
    )
    .unwrap();

    let model = models.typed::<Model>(root).unwrap();
    let ids: Vec<_> = model.child.into_iter().chain(model.children.iter().copied()).collect();
    assert_eq!(ids.len(), 3);
    for id in ids {
        let block = models.typed::<Block>(id).unwrap();
        assert_eq!(block.value, None);
        assert!(block.base.filepath.is_some());
    }
    assert_eq!(block_reads(), 0);
}

#[test]
fn test_stub_children_keep_their_files_on_relocation() {
    let tree = TestTree::new();
    tree.write_json("m/root.json", &json!({ "child": "sub/child.json" }));
    tree.write_json("m/sub/child.json", &json!({ "value": 9 }));
    let mut models = ModelArena::new();
    let root = load::<Model>(
        &mut models,
        tree.path("m/root.json"),
        &LoadOptions::default().recurse(false),
    )
    .unwrap();

    save_as(&mut models, root, tree.path("out/root.json"), &recursive()).unwrap();

    // The stub was never parsed, so it is written without content
    assert_eq!(tree.read_json("out/root.json"), json!({ "child": "sub/child.json" }));
    assert_eq!(tree.read_json("out/sub/child.json"), json!({}));
}

#[test]
fn test_missing_child_fails_load_with_not_found() {
    let tree = TestTree::new();
    tree.write_json("m/root.json", &json!({ "child": "missing.json" }));
    let mut ctx = context(&tree);
    let mut models = ModelArena::new();

    let err = load_with::<Model>(&mut ctx, &mut models, "m/root.json", &LoadOptions::default())
        .unwrap_err();

    assert!(matches!(err, Error::NotFound { ref path } if *path == tree.path("m/missing.json")));
    assert_eq!(ctx.frame_depth(), 0);
    assert!(ctx.cache_is_empty());
    assert!(models.is_empty());
}

#[test]
fn test_nested_validation_error_names_innermost_file() {
    let tree = TestTree::new();
    tree.write_json("m/root.json", &json!({ "child": "a.json" }));
    tree.write_json("m/a.json", &json!({ "nested": "deep/b.json" }));
    tree.write_json("m/deep/b.json", &json!({ "value": "seven" }));
    let mut models = ModelArena::new();

    let err = load::<Model>(&mut models, tree.path("m/root.json"), &LoadOptions::default())
        .unwrap_err();

    match err {
        Error::Validation { path, message } => {
            assert_eq!(path, tree.path("m/deep/b.json"));
            assert!(message.contains("integer"), "got: {message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_mixed_formats_load_by_extension() {
    let tree = TestTree::new();
    tree.write_file("m/root.toml", "name = \"mixed\"\nchild = \"child.yaml\"\n");
    tree.write_file("m/child.yaml", "value: 4\nnested: nested.json\n");
    tree.write_json("m/nested.json", &json!({ "label": "n" }));
    let mut models = ModelArena::new();

    let root = load::<Model>(&mut models, tree.path("m/root.toml"), &LoadOptions::default()).unwrap();

    let model = models.typed::<Model>(root).unwrap();
    assert_eq!(model.name.as_deref(), Some("mixed"));
    let child = models.typed::<Block>(model.child.unwrap()).unwrap();
    assert_eq!(child.value, Some(4));
    let nested = models.typed::<Block>(child.nested.unwrap()).unwrap();
    assert_eq!(nested.label.as_deref(), Some("n"));
}

#[test]
fn test_engine_config_drives_load_and_save() {
    let tree = TestTree::new();
    let config_path = tree.write_file(
        "engine.toml",
        "[load]\npath_style = \"windows\"\n\n[save]\nrecurse = true\npath_style = \"windows\"\n",
    );
    tree.write_json("m/root.json", &json!({ "child": "sub\\child.json" }));
    tree.write_json("m/sub/child.json", &json!({ "value": 1 }));
    let config = EngineConfig::from_file(&config_path).unwrap();
    let mut ctx = context(&tree);
    let mut models = ModelArena::new();

    let root = load_with::<Model>(&mut ctx, &mut models, "m/root.json", &config.load).unwrap();
    let child = models.typed::<Model>(root).unwrap().child.unwrap();
    models.typed_mut::<Block>(child).unwrap().value = Some(2);
    save_with(&mut ctx, &mut models, root, &config.save).unwrap();

    assert_eq!(tree.read_json("m/sub/child.json"), json!({ "value": 2 }));
    assert_eq!(tree.read_json("m/root.json"), json!({ "child": "sub\\child.json" }));
}

#[test]
fn test_non_recursive_save_leaves_children_alone() {
    let tree = TestTree::new();
    tree.write_json("m/root.json", &json!({ "name": "r", "child": "child.json" }));
    tree.write_json("m/child.json", &json!({ "value": 1 }));
    let mut models = ModelArena::new();
    let root = load::<Model>(&mut models, tree.path("m/root.json"), &LoadOptions::default()).unwrap();
    let child = models.typed::<Model>(root).unwrap().child.unwrap();
    models.typed_mut::<Block>(child).unwrap().value = Some(100);
    models.typed_mut::<Model>(root).unwrap().name = Some("renamed".into());

    save(&mut models, root, &SaveOptions::default()).unwrap();

    assert_eq!(tree.read_json("m/child.json"), json!({ "value": 1 }));
    assert_eq!(
        tree.read_json("m/root.json"),
        json!({ "name": "renamed", "child": "child.json" })
    );
}

#[test]
fn test_replaced_child_can_be_pruned() {
    let tree = TestTree::new();
    tree.write_json("m/root.json", &json!({ "child": "old.json" }));
    tree.write_json("m/old.json", &json!({ "value": 1 }));
    let mut models = ModelArena::new();
    let root = load::<Model>(&mut models, tree.path("m/root.json"), &LoadOptions::default()).unwrap();
    let old = models.typed::<Model>(root).unwrap().child.unwrap();
    let new = models.insert(Block::labeled("new", 2));
    models.typed_mut::<Model>(root).unwrap().child = Some(new);

    let removed = models.retain_reachable(&[root]).unwrap();

    assert_eq!(removed, 1);
    assert!(!models.contains(old));
    assert!(models.contains(new));
}
