//! Reading regions and locations out of MAPS.BSA
//!

use std::{
    fs::File,
    io::{Read, Seek},
    path::Path,
};

use df_bsa::{BsaArchive, BsaOptions, CacheOptions, RecordCache};
use tracing::{debug, instrument};

use crate::{
    error::{Error, Result},
    location::Location,
    names::region_index,
    region::Region,
};

/// Archive records making up one region
pub const RECORDS_PER_REGION: usize = 4;

const BUILDINGS: usize = 0;
const DUNGEONS: usize = 1;
const SUMMARIES: usize = 2;
const NAMES: usize = 3;

/// A decoded region together with the raw detail records its locations are read from
#[derive(Debug)]
struct RegionData {
    region: Region,
    buildings: Vec<u8>,
    dungeons: Vec<u8>,
}

/// Lazily decoding view of a map archive
///
/// ```no_run
/// use df_maps::MapsArchive;
///
/// fn list_dungeons(path: &str) -> df_maps::error::Result<()> {
///     let mut maps = MapsArchive::open(path)?;
///
///     for r in 0..maps.region_count() {
///         let count = maps.load_region(r)?.location_count();
///         for i in 0..count {
///             let location = maps.load_location(r, i)?;
///             if location.has_dungeon() {
///                 println!("{}", location.name);
///             }
///         }
///     }
///
///     Ok(())
/// }
/// ```
pub struct MapsArchive<R> {
    bsa: BsaArchive<R>,
    regions: RecordCache<usize, RegionData>,
    locations: RecordCache<(usize, usize), Location>,
}

impl MapsArchive<File> {
    /// Open a map archive from disk with auto discard enabled
    #[instrument(skip_all, fields(path = %path.as_ref().display()), err)]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let bsa = BsaArchive::open(path, BsaOptions::default())?;
        Ok(Self::from_archive(bsa, CacheOptions::default()))
    }
}

fn region_data<'r, R: Read + Seek>(
    bsa: &mut BsaArchive<R>,
    regions: &'r mut RecordCache<usize, RegionData>,
    region: usize,
) -> Result<&'r RegionData> {
    let count = bsa.len() / RECORDS_PER_REGION;
    if region >= count {
        return Err(Error::RegionNotFound { region, count });
    }

    regions.get_or_load(region, |&region| -> Result<RegionData> {
        let base = region * RECORDS_PER_REGION;
        let names = bsa.record_bytes(base + NAMES)?;
        let summaries = bsa.record_bytes(base + SUMMARIES)?;

        let data = RegionData {
            region: Region::decode(region, &names, &summaries)?,
            buildings: bsa.record_bytes(base + BUILDINGS)?,
            dungeons: bsa.record_bytes(base + DUNGEONS)?,
        };
        debug!(region, locations = data.region.location_count(), "loaded region");
        Ok(data)
    })
}

impl<R: Read + Seek> MapsArchive<R> {
    pub fn new(reader: R, options: CacheOptions) -> Result<Self> {
        Ok(Self::from_archive(BsaArchive::new(reader)?, options))
    }

    /// Regions and locations are cached separately, both following `options`
    pub fn from_archive(bsa: BsaArchive<R>, options: CacheOptions) -> Self {
        Self {
            bsa,
            regions: RecordCache::new(options),
            locations: RecordCache::new(options),
        }
    }

    /// Number of regions, four archive records each
    pub fn region_count(&self) -> usize {
        self.bsa.len() / RECORDS_PER_REGION
    }

    /// Index of a region by its built-in name, ignoring case
    pub fn region_index(&self, name: &str) -> Option<usize> {
        region_index(name).filter(|&r| r < self.region_count())
    }

    /// Decode a region's tables, or return them from the cache
    pub fn load_region(&mut self, region: usize) -> Result<&Region> {
        region_data(&mut self.bsa, &mut self.regions, region).map(|data| &data.region)
    }

    /// Decode one location of a region, or return it from the cache
    pub fn load_location(&mut self, region: usize, index: usize) -> Result<&Location> {
        let (bsa, regions) = (&mut self.bsa, &mut self.regions);
        self.locations
            .get_or_load((region, index), |&(region, index)| {
                let data = region_data(bsa, regions, region)?;
                Location::decode(&data.region, index, &data.buildings, &data.dungeons)
            })
    }

    /// Decode a location by name; duplicated names resolve to their first entry
    pub fn location_by_name(&mut self, region: usize, name: &str) -> Result<&Location> {
        let index = region_data(&mut self.bsa, &mut self.regions, region)?
            .region
            .location_index(name)
            .ok_or_else(|| Error::LocationNotFound {
                region,
                location: name.to_owned(),
            })?;
        self.load_location(region, index)
    }

    pub fn is_region_loaded(&self, region: usize) -> bool {
        self.regions.contains(&region)
    }

    /// Drop a decoded region, returning whether it was resident.
    ///
    /// Locations already decoded from it stay resident.
    pub fn discard_region(&mut self, region: usize) -> bool {
        self.regions.discard(&region).is_some()
    }

    pub fn discard_all_regions(&mut self) {
        self.regions.discard_all();
    }

    pub fn is_location_loaded(&self, region: usize, index: usize) -> bool {
        self.locations.contains(&(region, index))
    }

    /// Drop a decoded location, returning whether it was resident
    pub fn discard_location(&mut self, region: usize, index: usize) -> bool {
        self.locations.discard(&(region, index)).is_some()
    }

    pub fn discard_all_locations(&mut self) {
        self.locations.discard_all();
    }

    pub fn auto_discard(&self) -> bool {
        self.regions.auto_discard()
    }

    /// Change the residency policy of both regions and locations
    pub fn set_auto_discard(&mut self, auto_discard: bool) {
        self.regions.set_auto_discard(auto_discard);
        self.locations.set_auto_discard(auto_discard);
    }

    pub fn into_inner(self) -> BsaArchive<R> {
        self.bsa
    }
}
