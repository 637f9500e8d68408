//! Renderer collaborators
//!
//! Views hand their derived shape to a [`Renderer`] on every redraw and
//! forward song highlights. Pixel layout lives entirely behind this trait.

use serde::Serialize;
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use tracing::warn;

/// Draws one view's derived shape
pub trait Renderer<S> {
    /// Redraw from a freshly aggregated shape
    fn render(&mut self, shape: &S);

    /// Emphasize one song, or clear emphasis on `None`
    fn highlight(&mut self, _track_name: Option<&str>) {}
}

/// Shared handle, so the caller can inspect a renderer after handing it to a view
impl<S, R: Renderer<S>> Renderer<S> for Rc<RefCell<R>> {
    fn render(&mut self, shape: &S) {
        self.borrow_mut().render(shape);
    }

    fn highlight(&mut self, track_name: Option<&str>) {
        self.borrow_mut().highlight(track_name);
    }
}

/// Discards every frame
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl<S> Renderer<S> for NullRenderer {
    fn render(&mut self, _shape: &S) {}
}

/// Keeps every frame and highlight it receives
#[derive(Debug)]
pub struct Recorder<S> {
    pub frames: Vec<S>,
    pub highlights: Vec<Option<String>>,
}

impl<S> Default for Recorder<S> {
    fn default() -> Self {
        Self {
            frames: Vec::new(),
            highlights: Vec::new(),
        }
    }
}

impl<S> Recorder<S> {
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn last(&self) -> Option<&S> {
        self.frames.last()
    }
}

impl<S: Clone> Renderer<S> for Recorder<S> {
    fn render(&mut self, shape: &S) {
        self.frames.push(shape.clone());
    }

    fn highlight(&mut self, track_name: Option<&str>) {
        self.highlights.push(track_name.map(str::to_string));
    }
}

/// Output shared by several JSON-lines renderers
pub type SharedWriter = Rc<RefCell<dyn Write>>;

/// Writes each frame as one JSON line tagged with the view name
pub struct JsonLinesRenderer {
    view: &'static str,
    out: SharedWriter,
}

impl JsonLinesRenderer {
    pub fn new(view: &'static str, out: SharedWriter) -> Self {
        Self { view, out }
    }

    fn write_line(&self, value: serde_json::Value) {
        let mut out = self.out.borrow_mut();
        if let Err(e) = writeln!(out, "{}", value) {
            warn!("Failed to write {} frame: {}", self.view, e);
        }
    }
}

impl<S: Serialize> Renderer<S> for JsonLinesRenderer {
    fn render(&mut self, shape: &S) {
        match serde_json::to_value(shape) {
            Ok(frame) => self.write_line(serde_json::json!({ "view": self.view, "frame": frame })),
            Err(e) => warn!("Failed to encode {} frame: {}", self.view, e),
        }
    }

    fn highlight(&mut self, track_name: Option<&str>) {
        self.write_line(serde_json::json!({ "view": self.view, "highlight": track_name }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Clone, Debug, PartialEq)]
    struct Shape {
        n: u32,
    }

    #[test]
    fn test_recorder_through_shared_handle() {
        let recorder = Recorder::<Shape>::shared();
        let mut handle = Rc::clone(&recorder);
        handle.render(&Shape { n: 1 });
        handle.highlight(Some("As It Was"));
        handle.highlight(None);

        let recorder = recorder.borrow();
        assert_eq!(recorder.last(), Some(&Shape { n: 1 }));
        assert_eq!(recorder.highlights, [Some("As It Was".to_string()), None]);
    }

    #[test]
    fn test_json_lines_output() {
        let buffer = Rc::new(RefCell::new(Vec::<u8>::new()));
        let out: SharedWriter = buffer.clone();
        let mut renderer = JsonLinesRenderer::new("slope", out);

        Renderer::<Shape>::render(&mut renderer, &Shape { n: 7 });
        Renderer::<Shape>::highlight(&mut renderer, Some("Wait For U"));

        let text = String::from_utf8(buffer.borrow().clone()).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["view"], "slope");
        assert_eq!(lines[0]["frame"]["n"], 7);
        assert_eq!(lines[1]["highlight"], "Wait For U");
    }
}
