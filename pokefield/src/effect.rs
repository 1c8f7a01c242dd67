/// Audible feedback; the terminal shell turns these into a bell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    Encounter,
    Hit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Cue(Cue),
}
