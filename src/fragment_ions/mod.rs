mod ion_set;
mod ladder;

pub use ion_set::{
    is_n_terminal_series,
    IonSet,
    TheoMz,
    NUM_SERIES,
};
pub use ladder::IonLadder;
