use crate::drawing::DrawingElement;
use crate::error::{EditorError, Result};
use serde::{Deserialize, Serialize};

/// Ordered element list. Index order is paint order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scene {
    elements: Vec<DrawingElement>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_elements(elements: Vec<DrawingElement>) -> Self {
        Self { elements }
    }

    pub fn push(&mut self, element: DrawingElement) -> usize {
        self.elements.push(element);
        self.elements.len() - 1
    }

    /// Replaces the element at `index`. The replacement must be the same kind.
    pub fn replace(&mut self, index: usize, element: DrawingElement) -> Result<()> {
        let slot = self
            .elements
            .get_mut(index)
            .ok_or(EditorError::NoSuchElement { index })?;
        if !slot.same_kind(&element) {
            return Err(EditorError::VariantMismatch {
                existing: slot.kind(),
                replacement: element.kind(),
            });
        }
        *slot = element;
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<DrawingElement> {
        if index >= self.elements.len() {
            return Err(EditorError::NoSuchElement { index });
        }
        Ok(self.elements.remove(index))
    }

    pub fn replace_all(&mut self, elements: Vec<DrawingElement>) {
        self.elements = elements;
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    pub fn get(&self, index: usize) -> Option<&DrawingElement> {
        self.elements.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut DrawingElement> {
        self.elements.get_mut(index)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &DrawingElement> + ExactSizeIterator {
        self.elements.iter()
    }

    pub fn elements(&self) -> &[DrawingElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::{ImageRef, TextStyle};

    fn text(content: &str) -> DrawingElement {
        DrawingElement::text(
            [10.0, 10.0],
            content,
            [0.0, 0.0, 0.0, 1.0],
            TextStyle {
                font_size: 24.0,
                font_weight: 400,
                font_family: None,
            },
        )
    }

    #[test]
    fn appends_paint_on_top() {
        let mut scene = Scene::new();
        assert_eq!(scene.push(text("a")), 0);
        assert_eq!(scene.push(text("b")), 1);
        assert_eq!(scene.get(1), Some(&text("b")));
    }

    #[test]
    fn replace_all_swaps_the_whole_list() {
        let mut scene = Scene::from_elements(vec![text("a"), text("b")]);
        scene.replace_all(vec![text("c")]);
        assert_eq!(scene.elements(), &[text("c")]);
    }

    #[test]
    fn replace_keeps_the_variant() {
        let mut scene = Scene::from_elements(vec![text("a")]);
        scene.replace(0, text("b")).unwrap();
        assert_eq!(scene.get(0), Some(&text("b")));

        let image = DrawingElement::image([0.0, 0.0], [10.0, 10.0], ImageRef::new("x.png"));
        let err = scene.replace(0, image).unwrap_err();
        assert!(matches!(
            err,
            EditorError::VariantMismatch {
                existing: "text",
                replacement: "image"
            }
        ));
        assert!(matches!(scene.replace(3, text("c")), Err(EditorError::NoSuchElement { index: 3 })));
    }

    #[test]
    fn remove_out_of_range_is_an_error() {
        let mut scene = Scene::from_elements(vec![text("a"), text("b")]);
        assert_eq!(scene.remove(0).unwrap(), text("a"));
        assert_eq!(scene.len(), 1);
        assert!(scene.remove(5).is_err());
    }
}
