use super::state::Focus;

#[derive(Debug, Clone)]
pub enum Action {
    Quit,
    SetFocus(Focus),

    InputChar(char),
    Backspace,
    ClearInput,
    StartSearch,

    ListUp,
    ListDown,
    GoTop,
    GoBottom,
    PageUp,
    PageDown,

    NextFilter,
    PrevFilter,

    Activate,
    Refresh,
    ToggleHelp,
    Resize,
}
