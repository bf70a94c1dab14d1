//! Region name and summary tables

use std::collections::HashMap;

use binrw::{BinRead, BinWrite};
use derive_more::derive::Display;
use df_bsa::RecordView;
use tracing::{instrument, warn};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::{
    error::{Error, Result},
    names::region_name,
};

/// Width of a location name in the name table
pub const LOCATION_NAME_WIDTH: usize = 32;

/// Kind of place a location summary describes
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum LocationType {
    TownCity,
    TownHamlet,
    TownVillage,
    HomeFarms,
    DungeonLabyrinth,
    ReligionTemple,
    Tavern,
    DungeonKeep,
    HomeWealthy,
    ReligionCult,
    DungeonRuin,
    HomePoor,
    Graveyard,
    Coven,
    HomeYourShips,
    #[display("Unknown({_0})")]
    Unknown(u32),
}

impl From<u32> for LocationType {
    fn from(code: u32) -> Self {
        match code {
            0 => LocationType::TownCity,
            1 => LocationType::TownHamlet,
            2 => LocationType::TownVillage,
            3 => LocationType::HomeFarms,
            4 => LocationType::DungeonLabyrinth,
            5 => LocationType::ReligionTemple,
            6 => LocationType::Tavern,
            7 => LocationType::DungeonKeep,
            8 => LocationType::HomeWealthy,
            9 => LocationType::ReligionCult,
            10 => LocationType::DungeonRuin,
            11 => LocationType::HomePoor,
            12 => LocationType::Graveyard,
            13 => LocationType::Coven,
            14 => LocationType::HomeYourShips,
            other => LocationType::Unknown(other),
        }
    }
}

/// Summary table entry (15 bytes)
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[brw(little)]
pub struct LocationSummary {
    pub id: u32,
    pub flags: u8,
    pub bitfield: u32,
    pub latitude: u16,
    pub reserved1: u16,
    pub reserved2: u16,
}

impl LocationSummary {
    pub const SIZE: usize = 15;

    pub const fn longitude(&self) -> u32 {
        self.bitfield & 0x1ffff
    }

    pub const fn type_code(&self) -> u32 {
        self.bitfield >> 17
    }

    pub fn location_type(&self) -> LocationType {
        LocationType::from(self.type_code())
    }
}

/// A region's location names and summaries
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Region {
    pub index: usize,
    pub name: String,
    pub location_names: Vec<String>,
    pub summaries: Vec<LocationSummary>,
    #[cfg_attr(feature = "serde", serde(skip))]
    name_lookup: HashMap<String, usize>,
}

impl Region {
    /// Decode a region from its name table and summary table records
    #[instrument(skip(names, summaries), err)]
    pub fn decode(index: usize, names: &[u8], summaries: &[u8]) -> Result<Self> {
        let mut view = RecordView::new(names);
        let count = view.read_u32()? as usize;
        if count > view.remaining() / LOCATION_NAME_WIDTH {
            return Err(df_bsa::error::Error::UnexpectedEndOfData {
                position: view.position(),
                needed: count.saturating_mul(LOCATION_NAME_WIDTH),
                available: view.remaining(),
            }
            .into());
        }

        let location_names = (0..count)
            .map(|_| view.read_fixed_string(LOCATION_NAME_WIDTH))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if summaries.len() % LocationSummary::SIZE != 0 {
            return Err(Error::mismatch(format!(
                "region {index} summary table is {} bytes, not a multiple of {}",
                summaries.len(),
                LocationSummary::SIZE
            )));
        }
        let summary_count = summaries.len() / LocationSummary::SIZE;
        if summary_count != count {
            return Err(Error::mismatch(format!(
                "region {index} has {count} names but {summary_count} summaries"
            )));
        }
        let mut view = RecordView::new(summaries);
        let summaries = (0..summary_count)
            .map(|_| view.read_binrw::<LocationSummary>())
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut name_lookup = HashMap::with_capacity(count);
        for (i, name) in location_names.iter().enumerate() {
            if let Some(first) = name_lookup.get(name) {
                warn!(region = index, %name, first, duplicate = i, "duplicate location name");
                continue;
            }
            name_lookup.insert(name.clone(), i);
        }

        Ok(Self {
            index,
            name: region_name(index)
                .map(str::to_owned)
                .unwrap_or_else(|| format!("Region {index}")),
            location_names,
            summaries,
            name_lookup,
        })
    }

    pub fn location_count(&self) -> usize {
        self.location_names.len()
    }

    /// Index of a location by exact name. Duplicated names resolve to their first entry.
    pub fn location_index(&self, name: &str) -> Option<usize> {
        self.name_lookup.get(name).copied()
    }

    pub fn summary(&self, index: usize) -> Option<&LocationSummary> {
        self.summaries.get(index)
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::io::Cursor;

    use binrw::BinWrite;
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use crate::error::Result;
    use crate::region::{LocationSummary, LocationType, Region};

    pub(crate) fn name_table(names: &[&str]) -> Vec<u8> {
        let mut data = (names.len() as u32).to_le_bytes().to_vec();
        for name in names {
            let mut field = [0u8; 32];
            field[..name.len()].copy_from_slice(name.as_bytes());
            data.extend(field);
        }
        data
    }

    pub(crate) fn summary_table(summaries: &[LocationSummary]) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        summaries.iter().for_each(|s| s.write(&mut out).unwrap());
        out.into_inner()
    }

    #[test]
    fn summary_bitfield() {
        let summary = LocationSummary {
            bitfield: (5 << 17) | 0x1_2345,
            ..Default::default()
        };

        assert_eq!(summary.longitude(), 0x1_2345);
        assert_eq!(summary.type_code(), 5);
        assert_eq!(summary.location_type(), LocationType::ReligionTemple);
        assert_eq!(LocationType::from(99).to_string(), "Unknown(99)");
    }

    #[traced_test]
    #[test]
    fn decode_region_tables() -> Result<()> {
        let names = name_table(&["Ashford", "Old Keep", "Ashford"]);
        let summaries = summary_table(&[
            LocationSummary {
                id: 1,
                ..Default::default()
            },
            LocationSummary {
                id: 2,
                bitfield: 7 << 17,
                ..Default::default()
            },
            LocationSummary {
                id: 3,
                ..Default::default()
            },
        ]);

        let region = Region::decode(23, &names, &summaries)?;

        assert_eq!(region.name, "Wayrest");
        assert_eq!(region.location_count(), 3);
        assert_eq!(region.location_index("Old Keep"), Some(1));
        assert_eq!(region.location_index("Ashford"), Some(0));
        assert_eq!(region.location_index("ashford"), None);
        assert_eq!(
            region.summary(1).unwrap().location_type(),
            LocationType::DungeonKeep
        );
        assert!(logs_contain("duplicate location name"));

        Ok(())
    }

    #[test]
    fn summary_count_must_match_names() {
        let names = name_table(&["Ashford", "Old Keep"]);
        let summaries = summary_table(&[LocationSummary::default()]);

        let result = Region::decode(0, &names, &summaries);
        assert!(result.unwrap_err().is_structural_mismatch());
    }

    #[test]
    fn partial_summaries_are_rejected() {
        let names = name_table(&["Ashford", "Old Keep"]);
        let mut summaries = summary_table(&[LocationSummary::default(); 2]);
        summaries.extend([0u8; 7]);

        let result = Region::decode(0, &names, &summaries);
        assert!(result.unwrap_err().is_structural_mismatch());

        summaries.truncate(2 * LocationSummary::SIZE - 1);
        let result = Region::decode(0, &names, &summaries);
        assert!(result.unwrap_err().is_structural_mismatch());
    }

    #[test]
    fn truncated_name_table() {
        let mut names = name_table(&["Ashford", "Old Keep"]);
        names.truncate(40);

        let result = Region::decode(0, &names, &[]);
        assert!(result.unwrap_err().is_end_of_data());
    }

    #[test]
    fn regions_past_the_table_get_a_generic_name() -> Result<()> {
        let region = Region::decode(70, &name_table(&[]), &[])?;
        assert_eq!(region.name, "Region 70");
        Ok(())
    }
}
