use tracing::debug;

use crate::color::Color;

/// Visual side of the board. Implementations own their failure handling;
/// nothing reported back here can change game state.
pub trait Presenter {
    fn set_score(&mut self, score: u32);
    fn set_status(&mut self, text: &str);
    /// Highlights `color` for the flash window, then clears it.
    fn flash(&mut self, color: Color);
    fn set_start_label(&mut self, text: &str);
}

/// Audible side of the board. `play` is called once per flash, across every
/// round, so implementations must reuse whatever voice backs each color.
pub trait TonePlayer {
    fn play(&mut self, color: Color);
}

impl<P: Presenter + ?Sized> Presenter for Box<P> {
    fn set_score(&mut self, score: u32) {
        (**self).set_score(score);
    }

    fn set_status(&mut self, text: &str) {
        (**self).set_status(text);
    }

    fn flash(&mut self, color: Color) {
        (**self).flash(color);
    }

    fn set_start_label(&mut self, text: &str) {
        (**self).set_start_label(text);
    }
}

impl<T: TonePlayer + ?Sized> TonePlayer for Box<T> {
    fn play(&mut self, color: Color) {
        (**self).play(color);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn set_score(&mut self, _score: u32) {}
    fn set_status(&mut self, _text: &str) {}
    fn flash(&mut self, _color: Color) {}
    fn set_start_label(&mut self, _text: &str) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SilentTonePlayer;

impl TonePlayer for SilentTonePlayer {
    fn play(&mut self, color: Color) {
        debug!(%color, "tone (muted)");
    }
}
