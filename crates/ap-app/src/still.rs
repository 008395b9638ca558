use std::time::Duration;

use ap_ascii::Rasterizer;
use ap_core::error::PlayerError;
use ap_core::frame::Bitmap;
use ap_core::traits::{InputSource, Surface, UserEvent};

use crate::display::Display;

const POLL: Duration = Duration::from_millis(250);

/// Affiche une image fixe puis attend une touche.
///
/// Un redimensionnement du terminal relance la rasterisation.
///
/// # Errors
/// Sizing, rasterization, surface and input errors are all fatal here.
pub fn view<S: Surface, I: InputSource>(
    bitmap: &Bitmap,
    rasterizer: &Rasterizer,
    fully_filled: bool,
    display: &Display<S>,
    input: &mut I,
) -> Result<(), PlayerError> {
    let draw = || -> Result<(), PlayerError> {
        let (cols, rows) = display.canvas_size()?;
        let frame = rasterizer.rasterize(bitmap, cols, rows, fully_filled)?;
        display.show(&frame)?;
        Ok(())
    };

    draw()?;
    loop {
        match input.poll_event(POLL)? {
            Some(UserEvent::Resized) => {
                log::debug!("redimensionnement : nouveau rendu");
                draw()?;
            }
            Some(UserEvent::StopRequested | UserEvent::Key) => return Ok(()),
            None => {}
        }
    }
}
