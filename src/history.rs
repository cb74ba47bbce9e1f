use crate::scene::Scene;

/// Linear undo/redo over full scene snapshots.
///
/// `snapshots[cursor]` is always the scene currently shown. Index 0 is the
/// base snapshot taken when the session was seeded.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<Scene>,
    cursor: usize,
}

impl History {
    pub fn new(base: Scene) -> Self {
        Self {
            snapshots: vec![base],
            cursor: 0,
        }
    }

    /// Drops any redo branch and records `scene` as the newest snapshot.
    pub fn commit(&mut self, scene: &Scene) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(scene.clone());
        self.cursor = self.snapshots.len() - 1;
    }

    pub fn undo(&mut self) -> Option<&Scene> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(&self.snapshots[self.cursor])
    }

    pub fn redo(&mut self) -> Option<&Scene> {
        if self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        Some(&self.snapshots[self.cursor])
    }

    pub fn current(&self) -> &Scene {
        &self.snapshots[self.cursor]
    }

    /// Swaps the base snapshot while nothing has been committed on top of it.
    pub fn rebase(&mut self, base: Scene) -> bool {
        if self.snapshots.len() != 1 {
            return false;
        }
        self.snapshots[0] = base;
        true
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::DrawingElement;

    fn scene_with(n: usize) -> Scene {
        Scene::from_elements(
            (0..n)
                .map(|i| DrawingElement::Path {
                    points: vec![[i as f32, 0.0], [i as f32, 10.0]],
                    color: [0.0, 0.0, 0.0, 1.0],
                    stroke_width: 2.0,
                })
                .collect(),
        )
    }

    #[test]
    fn undo_and_redo_stop_at_the_ends() {
        let mut history = History::new(Scene::new());
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());

        history.commit(&scene_with(1));
        assert_eq!(history.undo().map(Scene::len), Some(0));
        assert!(history.undo().is_none());
        assert_eq!(history.redo().map(Scene::len), Some(1));
        assert!(history.redo().is_none());
    }

    #[test]
    fn commit_after_undo_discards_the_redo_branch() {
        let mut history = History::new(Scene::new());
        history.commit(&scene_with(1));
        history.commit(&scene_with(2));
        history.undo();
        history.commit(&scene_with(3));

        assert!(!history.can_redo());
        assert_eq!(history.len(), 3);
        assert_eq!(history.current().len(), 3);
        assert_eq!(history.undo().map(Scene::len), Some(1));
    }

    #[test]
    fn rebase_only_before_the_first_commit() {
        let mut history = History::new(Scene::new());
        assert!(history.rebase(scene_with(1)));
        assert_eq!(history.current().len(), 1);
        history.commit(&scene_with(2));
        assert!(!history.rebase(scene_with(5)));
        assert_eq!(history.undo().map(Scene::len), Some(1));
    }
}
