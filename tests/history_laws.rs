use bannercanvas::history::History;
use bannercanvas::text_renderer::FontBook;
use bannercanvas::{DrawingElement, Editor, EditorConfig, Scene};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Add,
    Delete,
    Undo,
    Redo,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Add),
        1 => Just(Op::Delete),
        2 => Just(Op::Undo),
        2 => Just(Op::Redo),
    ]
}

fn scene_of(len: usize) -> Scene {
    Scene::from_elements(
        (0..len)
            .map(|i| DrawingElement::Path {
                points: vec![[i as f32, 0.0], [i as f32, 1.0]],
                color: [0.0, 0.0, 0.0, 1.0],
                stroke_width: 1.0,
            })
            .collect(),
    )
}

proptest! {
    /// The editor behaves like a linear snapshot list with a cursor: a
    /// commit drops the redo branch, undo and redo move the cursor.
    #[test]
    fn editor_history_matches_a_snapshot_model(ops in prop::collection::vec(op(), 1..40)) {
        let mut editor = Editor::with_font_book(&EditorConfig::default(), FontBook::new("Arial")).unwrap();
        let mut snapshots = vec![0usize];
        let mut cursor = 0usize;

        for op in ops {
            match op {
                Op::Add => {
                    editor.add_text();
                    snapshots.truncate(cursor + 1);
                    snapshots.push(snapshots[cursor] + 1);
                    cursor += 1;
                }
                Op::Delete => {
                    if editor.selected().is_some() {
                        editor.delete(|| false);
                        snapshots.truncate(cursor + 1);
                        snapshots.push(snapshots[cursor] - 1);
                        cursor += 1;
                    }
                }
                Op::Undo => {
                    prop_assert_eq!(editor.undo(), cursor > 0);
                    cursor = cursor.saturating_sub(1);
                }
                Op::Redo => {
                    let can = cursor + 1 < snapshots.len();
                    prop_assert_eq!(editor.redo(), can);
                    if can {
                        cursor += 1;
                    }
                }
            }
            prop_assert_eq!(editor.scene().len(), snapshots[cursor]);
            prop_assert_eq!(editor.can_undo(), cursor > 0);
            prop_assert_eq!(editor.can_redo(), cursor + 1 < snapshots.len());
            prop_assert_eq!(editor.history().cursor(), cursor);
        }
    }

    #[test]
    fn undo_then_redo_returns_to_the_same_scene(lens in prop::collection::vec(0usize..6, 1..12)) {
        let mut history = History::new(Scene::new());
        for len in &lens {
            history.commit(&scene_of(*len));
        }
        let top = history.current().clone();
        let steps = lens.len();
        for _ in 0..steps {
            prop_assert!(history.undo().is_some());
        }
        prop_assert!(history.undo().is_none());
        prop_assert_eq!(history.current(), &Scene::new());
        for _ in 0..steps {
            prop_assert!(history.redo().is_some());
        }
        prop_assert!(history.redo().is_none());
        prop_assert_eq!(history.current(), &top);
    }
}
