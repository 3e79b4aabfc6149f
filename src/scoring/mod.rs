mod bin_list;
mod kernels;

pub use bin_list::{
    set_bin_list,
    shared_score,
    BinList,
};
pub use kernels::{
    kojak_score,
    xcorr_score,
};
