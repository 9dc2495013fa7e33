//! Partial register snapshots for host transfer.

use crate::state::{ADDRESS_REGISTER_COUNT, DATA_REGISTER_COUNT};
use crate::{OpSize, RegisterFile};

/// Register and flag values with one optional field per register.
///
/// Reading from a machine fills every field. Applying a snapshot writes only
/// the fields that are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CpuState {
    /// `D0..D7`.
    pub d: [Option<u32>; DATA_REGISTER_COUNT],
    /// `A0..A6`.
    pub a: [Option<u32>; ADDRESS_REGISTER_COUNT],
    /// User stack pointer.
    pub usp: Option<u32>,
    /// Supervisor stack pointer.
    pub ssp: Option<u32>,
    /// Program counter.
    pub pc: Option<u32>,
    /// Status register.
    pub sr: Option<u16>,
}

impl CpuState {
    /// Returns `true` when no field is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns a copy of `regs` with every present field written over it.
    #[must_use]
    pub fn apply_to(&self, regs: &RegisterFile) -> RegisterFile {
        let mut next = regs.clone();
        if let Some(sr) = self.sr {
            next.set_sr(sr);
        }
        for (n, value) in (0u8..).zip(self.d) {
            if let Some(value) = value {
                next.write_data(n, value, OpSize::Long);
            }
        }
        for (n, value) in (0u8..).zip(self.a) {
            if let Some(value) = value {
                next.write_address(n, value, OpSize::Long);
            }
        }
        if let Some(usp) = self.usp {
            next.set_usp(usp);
        }
        if let Some(ssp) = self.ssp {
            next.set_ssp(ssp);
        }
        if let Some(pc) = self.pc {
            next.set_pc(pc);
        }
        next
    }

    /// Combines two snapshots; fields present in `top` win.
    #[must_use]
    pub fn overlay(&self, top: &Self) -> Self {
        let mut merged = *self;
        for (slot, value) in merged.d.iter_mut().zip(top.d) {
            *slot = value.or(*slot);
        }
        for (slot, value) in merged.a.iter_mut().zip(top.a) {
            *slot = value.or(*slot);
        }
        merged.usp = top.usp.or(self.usp);
        merged.ssp = top.ssp.or(self.ssp);
        merged.pc = top.pc.or(self.pc);
        merged.sr = top.sr.or(self.sr);
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::CpuState;
    use crate::state::{SR_S, SR_Z};
    use crate::{OpSize, RegisterFile};

    #[test]
    fn applying_partial_state_leaves_absent_fields() {
        let mut regs = RegisterFile::default();
        regs.write_data(0, 0x11, OpSize::Long);
        regs.write_data(1, 0x22, OpSize::Long);

        let mut state = CpuState::default();
        state.d[1] = Some(0xAB);
        state.pc = Some(0x1000);
        let next = state.apply_to(&regs);

        assert_eq!(next.read_data(0), 0x11);
        assert_eq!(next.read_data(1), 0xAB);
        assert_eq!(next.pc(), 0x1000);
        assert_eq!(regs.read_data(1), 0x22);
    }

    #[test]
    fn address_fields_do_not_touch_stack_pointers() {
        let mut state = CpuState::default();
        state.a[6] = Some(0x700);
        state.sr = Some(SR_S);
        state.ssp = Some(0x3000);
        let next = state.apply_to(&RegisterFile::default());
        assert_eq!(next.read_address(6), 0x700);
        assert_eq!(next.read_address(7), 0x3000);
        assert_eq!(next.usp(), 0);
    }

    #[test]
    fn full_snapshot_round_trips_through_apply() {
        let mut regs = RegisterFile::default();
        regs.write_data(5, 0xDEAD_BEEF, OpSize::Long);
        regs.set_sr(SR_Z);
        regs.set_usp(0x4000);
        let copy = regs.snapshot().apply_to(&RegisterFile::default());
        assert_eq!(copy, regs);
    }

    #[test]
    fn overlay_prefers_top_fields() {
        let mut base = CpuState::default();
        base.d[0] = Some(1);
        base.d[1] = Some(2);
        let mut top = CpuState::default();
        top.d[1] = Some(3);
        top.sr = Some(SR_Z);

        let merged = base.overlay(&top);
        assert_eq!(merged.d[0], Some(1));
        assert_eq!(merged.d[1], Some(3));
        assert_eq!(merged.sr, Some(SR_Z));
        assert!(CpuState::default().is_empty());
        assert!(!merged.is_empty());
    }
}
