use crate::app::App;
use crate::mpris::MprisHandle;

/// Track metadata follows the queue through `MprisObserver`; only the
/// playback status needs pushing from the loop.
pub fn update_mpris(mpris: &MprisHandle, app: &App) {
    mpris.set_playback(app.playback);
}
