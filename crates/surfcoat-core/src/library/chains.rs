use super::moieties;
use crate::assembly::chain::ChainBuilder;
use crate::assembly::error::AssemblyError;
use crate::core::models::fragment::Fragment;

/// A terminal-functionalized alkylsilane chain.
///
/// An alkane backbone of `chain_length` methylene units with the given
/// terminal group at the top and a silane at the bottom, whose open port is
/// exposed as the chain's `down`, the port that grafts onto a surface.
/// Units are twisted around the chain axis to stagger the hydrogens.
pub fn alkylsilane(chain_length: usize, terminal_group: Fragment) -> Result<Fragment, AssemblyError> {
    ChainBuilder::new(moieties::methylene())
        .name("alkylsilane")
        .repeat(chain_length)
        .head(terminal_group, "down")
        .tail(moieties::silane(), "up")
        .twist(true)
        .build()
}

/// The stock methyl-terminated alkylsilane.
pub fn methyl_alkylsilane(chain_length: usize) -> Result<Fragment, AssemblyError> {
    alkylsilane(chain_length, moieties::methyl())
}
