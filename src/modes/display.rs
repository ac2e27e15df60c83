use crate::model::images::ImageStore;
use crate::model::mode::Mode;
use crate::panel::Panel;

pub const NAME: &str = "display";

/// Shows stored images, one at a time, with an optional origin offset.
pub struct DisplayMode<S> {
    store: S,
    current: Option<String>,
}

impl<S: ImageStore> DisplayMode<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            current: None,
        }
    }

    #[cfg(test)]
    pub fn current_image(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Show `name` so its pixel (`x`, `y`) sits at the panel origin.
    ///
    /// Returns false when the image is missing or cannot be shown; the panel
    /// is left untouched in that case.
    fn show(&mut self, panel: &mut dyn Panel, name: &str, x: i32, y: i32) -> bool {
        let image = match self.store.load(name) {
            Ok(image) => image,
            Err(err) => {
                tracing::warn!("display: {err}");
                return false;
            }
        };

        let shown = panel
            .clear()
            .and_then(|()| panel.set_image(&image, -x, -y));
        if let Err(err) = shown {
            tracing::warn!(image = name, "display: panel error: {err}");
            return false;
        }

        self.current = Some(name.to_string());
        true
    }

    /// Step through the sorted listing, wrapping at both ends. An image that
    /// has disappeared restarts at the first one.
    fn step(&mut self, panel: &mut dyn Panel, images: &[String], delta: isize) -> bool {
        let position = self
            .current
            .as_ref()
            .and_then(|current| images.iter().position(|name| name == current));

        let next = match position {
            Some(pos) => (pos as isize + delta).rem_euclid(images.len() as isize) as usize,
            None => 0,
        };
        self.show(panel, &images[next], 0, 0)
    }
}

impl<S: ImageStore> Mode for DisplayMode<S> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn handle_command(&mut self, panel: &mut dyn Panel, args: &[String]) -> bool {
        let images = self.store.list();
        if images.is_empty() {
            tracing::info!("display: no images available");
            return false;
        }

        let Some(verb) = args.first() else {
            return self.show(panel, &images[0], 0, 0);
        };

        match verb.as_str() {
            "image" => match args.get(1) {
                Some(name) => {
                    let x = coerce_int(args.get(2));
                    let y = coerce_int(args.get(3));
                    self.show(panel, name, x, y)
                }
                None => false,
            },
            "next" => self.step(panel, &images, 1),
            "prev" => self.step(panel, &images, -1),
            _ => true,
        }
    }
}

/// Missing or non-numeric coordinates become 0.
fn coerce_int(arg: Option<&String>) -> i32 {
    arg.and_then(|s| s.parse().ok()).unwrap_or(0)
}
