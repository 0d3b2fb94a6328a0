//! Dispatch from a leaf's widget to the host's renderer.

use formtree_fields::{LeafConfig, SelectOption, Widget};

/// One method per widget kind. Adding a kind breaks every renderer at
/// compile time rather than falling through at runtime.
pub trait WidgetRenderer {
    type Output;

    fn text(
        &mut self,
        path: &str,
        leaf: &LeafConfig,
        multiline: bool,
        max_length: Option<usize>,
    ) -> Self::Output;

    fn number(
        &mut self,
        path: &str,
        leaf: &LeafConfig,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Self::Output;

    fn boolean(&mut self, path: &str, leaf: &LeafConfig) -> Self::Output;

    fn select(&mut self, path: &str, leaf: &LeafConfig, options: &[SelectOption]) -> Self::Output;

    fn multi_select(
        &mut self,
        path: &str,
        leaf: &LeafConfig,
        options: &[SelectOption],
    ) -> Self::Output;

    fn hidden(&mut self, path: &str, leaf: &LeafConfig) -> Self::Output;
}

/// Render `leaf`, addressed by `path`, with the method for its widget.
pub fn render_leaf<R>(path: &str, leaf: &LeafConfig, renderer: &mut R) -> R::Output
where
    R: WidgetRenderer + ?Sized,
{
    match &leaf.widget {
        Widget::Text {
            multiline,
            max_length,
        } => renderer.text(path, leaf, *multiline, *max_length),
        Widget::Number { min, max } => renderer.number(path, leaf, *min, *max),
        Widget::Boolean => renderer.boolean(path, leaf),
        Widget::Select { options } => renderer.select(path, leaf, options),
        Widget::MultiSelect { options } => renderer.multi_select(path, leaf, options),
        Widget::Hidden => renderer.hidden(path, leaf),
    }
}
