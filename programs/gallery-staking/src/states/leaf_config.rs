use anchor_lang::prelude::*;

use crate::constants::{MAX_ACCEPTED_VALUES, MAX_SLOTS, MAX_SLOT_REQUIREMENTS};
use crate::errors::ErrorCode;
use crate::states::asset_record::TraitValue;

/// One admission rule: the asset must carry the trait and its value must
/// be in the accepted set.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, InitSpace)]
pub struct Requirement {
    pub trait_id: u16,
    #[max_len(MAX_ACCEPTED_VALUES)]
    pub accepted_values: Vec<u32>,
}

/// The requirement set of one slot. An empty set admits any asset.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, InitSpace)]
pub struct SlotDefinition {
    #[max_len(MAX_SLOT_REQUIREMENTS)]
    pub requirements: Vec<Requirement>,
}

/// Per-leaf configuration: the slot definitions every gallery of the leaf
/// shares, fixed at registration, plus the gallery id cursor.
#[account]
#[derive(InitSpace)]
pub struct LeafConfig {
    /// The distribution tree this leaf belongs to
    pub tree: Pubkey,
    /// The leaf node id
    pub node_id: u32,
    #[max_len(MAX_SLOTS)]
    pub slots: Vec<SlotDefinition>,
    /// Next free gallery id
    pub next_gallery_id: u32,
    /// Bump seed for the PDA
    pub bump: u8,
}

impl LeafConfig {
    pub fn slot_count(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Checks a trait vector against a slot's requirement set.
    pub fn check_admission(&self, slot_id: u32, traits: &[TraitValue]) -> Result<()> {
        let slot = self
            .slots
            .get(slot_id as usize)
            .ok_or(ErrorCode::InvalidSlot)?;
        for requirement in &slot.requirements {
            require!(
                requirement_met(requirement, traits),
                ErrorCode::SlotRequirementNotMet
            );
        }
        Ok(())
    }
}

fn requirement_met(requirement: &Requirement, traits: &[TraitValue]) -> bool {
    traits.iter().any(|value| {
        value.trait_id == requirement.trait_id
            && requirement.accepted_values.contains(&value.value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_lang::error::Error;

    fn config(slots: Vec<SlotDefinition>) -> LeafConfig {
        LeafConfig {
            tree: Pubkey::new_unique(),
            node_id: 1,
            slots,
            next_gallery_id: 0,
            bump: 0,
        }
    }

    fn trait_value(trait_id: u16, value: u32) -> TraitValue {
        TraitValue { trait_id, value }
    }

    #[test]
    fn empty_requirements_admit_anything() {
        let cfg = config(vec![SlotDefinition {
            requirements: Vec::new(),
        }]);
        cfg.check_admission(0, &[]).unwrap();
        cfg.check_admission(0, &[trait_value(0, 7)]).unwrap();
    }

    #[test]
    fn out_of_range_slot_is_rejected() {
        let cfg = config(vec![SlotDefinition {
            requirements: Vec::new(),
        }]);
        let err = cfg.check_admission(1, &[]).unwrap_err();
        assert_eq!(err, Error::from(ErrorCode::InvalidSlot));
    }

    #[test]
    fn every_requirement_must_be_met() {
        let cfg = config(vec![SlotDefinition {
            requirements: vec![
                Requirement {
                    trait_id: 0,
                    accepted_values: vec![3],
                },
                Requirement {
                    trait_id: 1,
                    accepted_values: vec![1],
                },
            ],
        }]);

        cfg.check_admission(0, &[trait_value(0, 3), trait_value(1, 1)])
            .unwrap();

        // wrong value on the first trait
        let err = cfg
            .check_admission(0, &[trait_value(0, 2), trait_value(1, 1)])
            .unwrap_err();
        assert_eq!(err, Error::from(ErrorCode::SlotRequirementNotMet));

        // second trait missing entirely
        let err = cfg.check_admission(0, &[trait_value(0, 3)]).unwrap_err();
        assert_eq!(err, Error::from(ErrorCode::SlotRequirementNotMet));
    }

    #[test]
    fn any_accepted_value_passes() {
        let cfg = config(vec![SlotDefinition {
            requirements: vec![Requirement {
                trait_id: 0,
                accepted_values: vec![4, 2],
            }],
        }]);
        cfg.check_admission(0, &[trait_value(0, 2)]).unwrap();
        cfg.check_admission(0, &[trait_value(0, 4)]).unwrap();
        let err = cfg.check_admission(0, &[trait_value(0, 1)]).unwrap_err();
        assert_eq!(err, Error::from(ErrorCode::SlotRequirementNotMet));
    }
}
