use serde::{Deserialize, Serialize};

use crate::input::HeldKeys;

#[derive(tui_dispatch::Action, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[action(infer_categories)]
pub enum Action {
    Init,
    UiTerminalResize(u16, u16),
    /// One frame of game time with the directions held during it.
    Tick { dt_ms: u64, keys: HeldKeys },

    // Field
    Interact,

    // Battle
    BattleMenuUp,
    BattleMenuDown,
    BattleMenuLeft,
    BattleMenuRight,
    BattleConfirm,
    BattleCancel,

    UiToggleDebug,
    Quit,
}
