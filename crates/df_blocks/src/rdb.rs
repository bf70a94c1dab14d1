//! Dungeon (RDB) block layouts
//!
//! Objects placed in a dungeon block are stored as singly linked lists threaded through the record
//! by byte offset, one list per cell of a `width x height` grid. Decoding flattens every list into
//! one arena so callers never follow offsets themselves.

use std::{collections::HashMap, ops::Range};

use binrw::{BinRead, BinWrite};
use derive_more::derive::Display;
use df_bsa::RecordView;
use tracing::{debug, instrument};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::{
    error::{Error, Result},
    types::{Position, RdbBlockLetter, TextureRef},
};

/// Entries in the model reference table
pub const MODEL_REFERENCE_COUNT: usize = 750;

/// Longest object list followed before the layout is considered corrupt
pub const MAX_OBJECT_CHAIN: usize = 4096;

/// Position of the object section in every well formed RDB
pub const OBJECT_SECTION_OFFSET: u32 = 20 + MODEL_REFERENCE_COUNT as u32 * 12;

/// Fixed RDB header (20 bytes)
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[brw(little)]
pub struct RdbHeader {
    pub reserved1: u32,
    pub width: u32,
    pub height: u32,
    pub object_root_offset: u32,
    pub reserved2: u32,
}

/// Model referenced by index from placed model objects (8 bytes)
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[brw(little)]
pub struct ModelReference {
    pub model_id: [u8; 5],
    pub description: [u8; 3],
}

impl ModelReference {
    /// Model id digits as text
    pub fn model_id_str(&self) -> String {
        self.model_id
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect()
    }

    /// Numeric model id, `None` for unused slots
    pub fn model_id_num(&self) -> Option<u32> {
        self.model_id_str().trim().parse().ok()
    }

    pub fn description(&self) -> String {
        self.description
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect()
    }
}

/// Object section header (512 bytes)
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[brw(little)]
pub struct ObjectSectionHeader {
    pub unknown_offset: i32,
    pub reserved1: i32,
    pub reserved2: i32,
    pub reserved3: i32,
    pub length: u32,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub reserved4: [u8; 32],
    pub tag: [u8; 4],
    #[cfg_attr(feature = "serde", serde(skip))]
    pub reserved5: [u8; 456],
}

impl Default for ObjectSectionHeader {
    fn default() -> Self {
        Self {
            unknown_offset: 0,
            reserved1: 0,
            reserved2: 0,
            reserved3: 0,
            length: 0,
            reserved4: [0; 32],
            tag: *b"DAGR",
            reserved5: [0; 456],
        }
    }
}

/// Raw list node (25 bytes)
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct ObjectNode {
    pub next: i32,
    pub previous: i32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub resource_type: u8,
    pub resource_offset: u32,
}

/// Resource tag of a list node
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[repr(u8)]
pub enum ResourceType {
    Model = 0x01,
    Light = 0x02,
    Flat = 0x03,
}

impl ResourceType {
    fn from_tag(resource_type: u8, offset: i32) -> Result<Self> {
        match resource_type {
            0x01 => Ok(ResourceType::Model),
            0x02 => Ok(ResourceType::Light),
            0x03 => Ok(ResourceType::Flat),
            _ => Err(Error::UnknownResourceType {
                resource_type,
                offset,
            }),
        }
    }
}

#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct ModelResource {
    pub x_rotation: i32,
    pub y_rotation: i32,
    pub z_rotation: i32,
    pub model_index: u16,
    pub trigger_flag_starting_lock: u32,
    pub sound_index: u8,
    pub action_offset: i32,
}

#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct ActionResource {
    pub axis: u8,
    pub duration: u16,
    pub magnitude: u16,
    pub next_object_offset: i32,
    pub flags: u8,
}

#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[brw(little)]
pub struct RdbLight {
    pub reserved1: u32,
    pub reserved2: u32,
    pub radius: u16,
}

#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[brw(little)]
pub struct RdbFlat {
    pub texture_bitfield: u16,
    pub gender: u16,
    pub faction_or_mobile_id: u16,
    pub magnitude: u8,
    pub sound_index: u8,
    pub next_object_offset: i32,
    pub action: u8,
}

impl RdbFlat {
    pub const fn texture(&self) -> TextureRef {
        TextureRef::from_bitfield(self.texture_bitfield)
    }
}

/// Movement attached to a model
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RdbAction {
    pub axis: u8,
    pub duration: u16,
    pub magnitude: u16,
    pub next_object_offset: i32,
    /// Arena index of the object triggered next
    pub next_object: Option<usize>,
    pub flags: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RdbModel {
    pub rotation: Position,
    pub model_index: u16,
    pub trigger_flag_starting_lock: u32,
    pub sound_index: u8,
    pub action: Option<RdbAction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum RdbResource {
    Model(RdbModel),
    Light(RdbLight),
    Flat(RdbFlat),
}

impl RdbResource {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            RdbResource::Model(_) => ResourceType::Model,
            RdbResource::Light(_) => ResourceType::Light,
            RdbResource::Flat(_) => ResourceType::Flat,
        }
    }
}

/// A placed object, linked to its neighbours by arena index
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RdbObject {
    /// Offset of the node within the record
    pub offset: i32,
    pub next_offset: i32,
    pub previous_offset: i32,
    pub next: Option<usize>,
    pub previous: Option<usize>,
    pub position: Position,
    pub resource: RdbResource,
}

/// Head of one grid cell's object list
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RdbObjectRoot {
    /// Negative when the cell is empty
    pub root_offset: i32,
    /// Arena range holding the list, in list order
    pub objects: Range<usize>,
}

/// Decoded dungeon block
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RdbBlock {
    pub name: String,
    pub letter: RdbBlockLetter,
    pub header: RdbHeader,
    pub model_references: Vec<ModelReference>,
    pub model_data: Vec<u32>,
    pub object_header: ObjectSectionHeader,
    pub roots: Vec<RdbObjectRoot>,
    pub objects: Vec<RdbObject>,
}

impl RdbBlock {
    /// Decode a dungeon block starting at the view's cursor
    #[instrument(skip(view), fields(len = view.len()), err)]
    pub fn decode(view: &mut RecordView, name: &str) -> Result<Self> {
        let header: RdbHeader = view.read_binrw()?;

        let model_references = (0..MODEL_REFERENCE_COUNT)
            .map(|_| view.read_binrw::<ModelReference>())
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let model_data = (0..MODEL_REFERENCE_COUNT)
            .map(|_| view.read_u32())
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if view.position() != header.object_root_offset as usize {
            return Err(Error::mismatch(format!(
                "object section at {} but header declares {}",
                view.position(),
                header.object_root_offset
            )));
        }
        let object_header: ObjectSectionHeader = view.read_binrw()?;

        let cells = (header.width as usize)
            .checked_mul(header.height as usize)
            .filter(|&c| c <= view.remaining() / 4)
            .ok_or_else(|| {
                Error::mismatch(format!(
                    "{}x{} object grid does not fit the record",
                    header.width, header.height
                ))
            })?;
        let root_offsets = (0..cells)
            .map(|_| view.read_i32())
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut objects = Vec::new();
        let mut roots = Vec::with_capacity(cells);
        // cells sharing a list head share its arena range
        let mut chains: HashMap<i32, Range<usize>> = HashMap::new();
        for &root_offset in &root_offsets {
            let range = if root_offset < 0 {
                objects.len()..objects.len()
            } else if let Some(range) = chains.get(&root_offset) {
                range.clone()
            } else {
                let start = objects.len();
                read_chain(view, root_offset, &mut objects)?;
                chains.insert(root_offset, start..objects.len());
                start..objects.len()
            };
            roots.push(RdbObjectRoot {
                root_offset,
                objects: range,
            });
        }

        resolve_actions(&mut objects);
        debug!(roots = roots.len(), objects = objects.len(), "decoded objects");

        Ok(Self {
            name: name.to_owned(),
            letter: RdbBlockLetter::from_name(name),
            header,
            model_references,
            model_data,
            object_header,
            roots,
            objects,
        })
    }

    /// Objects listed under one root, in list order
    pub fn objects_for(&self, root: &RdbObjectRoot) -> &[RdbObject] {
        &self.objects[root.objects.clone()]
    }

    /// Numeric model id for a model object's `model_index`
    pub fn model_id(&self, model_index: u16) -> Option<u32> {
        self.model_references
            .get(model_index as usize)
            .and_then(ModelReference::model_id_num)
    }
}

fn read_node(view: &mut RecordView, offset: i32) -> Result<ObjectNode> {
    let position = usize::try_from(offset)
        .map_err(|_| Error::mismatch(format!("object offset {offset} is negative")))?;
    view.seek(position)?;
    Ok(view.read_binrw()?)
}

/// Count the nodes of a list, refusing lists longer than [`MAX_OBJECT_CHAIN`]
fn chain_length(view: &mut RecordView, root_offset: i32) -> Result<usize> {
    let mut offset = root_offset;
    let mut count = 0;

    loop {
        let node = read_node(view, offset)?;
        count += 1;

        if node.next < 0 {
            return Ok(count);
        }
        if count >= MAX_OBJECT_CHAIN {
            return Err(Error::mismatch(format!(
                "object list at {root_offset} is longer than {MAX_OBJECT_CHAIN} nodes"
            )));
        }
        offset = node.next;
    }
}

fn read_chain(
    view: &mut RecordView,
    root_offset: i32,
    objects: &mut Vec<RdbObject>,
) -> Result<()> {
    let count = chain_length(view, root_offset)?;
    let start = objects.len();

    let mut nodes = Vec::with_capacity(count);
    let mut offset = root_offset;
    for _ in 0..count {
        let node = read_node(view, offset)?;
        let resource = read_resource(view, &node, offset)?;
        nodes.push((offset, node, resource));
        offset = node.next;
    }

    let by_offset: HashMap<i32, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, (offset, _, _))| (*offset, start + i))
        .collect();

    objects.extend(nodes.into_iter().map(|(offset, node, resource)| RdbObject {
        offset,
        next_offset: node.next,
        previous_offset: node.previous,
        next: by_offset.get(&node.next).copied(),
        previous: by_offset.get(&node.previous).copied(),
        position: Position {
            x: node.x,
            y: node.y,
            z: node.z,
        },
        resource,
    }));

    Ok(())
}

fn read_resource(view: &mut RecordView, node: &ObjectNode, offset: i32) -> Result<RdbResource> {
    let resource_type = ResourceType::from_tag(node.resource_type, offset)?;
    view.seek(node.resource_offset as usize)?;

    let resource = match resource_type {
        ResourceType::Model => {
            let model: ModelResource = view.read_binrw()?;
            let action = if model.action_offset > 0 {
                view.seek(model.action_offset as usize)?;
                let action: ActionResource = view.read_binrw()?;
                Some(RdbAction {
                    axis: action.axis,
                    duration: action.duration,
                    magnitude: action.magnitude,
                    next_object_offset: action.next_object_offset,
                    next_object: None,
                    flags: action.flags,
                })
            } else {
                None
            };

            RdbResource::Model(RdbModel {
                rotation: Position {
                    x: model.x_rotation,
                    y: model.y_rotation,
                    z: model.z_rotation,
                },
                model_index: model.model_index,
                trigger_flag_starting_lock: model.trigger_flag_starting_lock,
                sound_index: model.sound_index,
                action,
            })
        }
        ResourceType::Light => RdbResource::Light(view.read_binrw()?),
        ResourceType::Flat => RdbResource::Flat(view.read_binrw()?),
    };

    Ok(resource)
}

fn resolve_actions(objects: &mut [RdbObject]) {
    let by_offset: HashMap<i32, usize> = objects
        .iter()
        .enumerate()
        .map(|(i, o)| (o.offset, i))
        .collect();

    for object in objects.iter_mut() {
        if let RdbResource::Model(RdbModel {
            action: Some(action),
            ..
        }) = &mut object.resource
        {
            action.next_object = by_offset.get(&action.next_object_offset).copied();
        }
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::io::{Cursor, Seek, SeekFrom};

    use binrw::BinWrite;
    use df_bsa::RecordView;
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use crate::error::{Error, Result};
    use crate::rdb::{
        ActionResource, ModelReference, ModelResource, ObjectNode, ObjectSectionHeader, RdbBlock,
        RdbFlat, RdbHeader, RdbLight, RdbResource, MAX_OBJECT_CHAIN, MODEL_REFERENCE_COUNT,
        OBJECT_SECTION_OFFSET,
    };
    use crate::types::RdbBlockLetter;

    /// Writes an RDB with a `width x height` grid. Objects are appended after the root list.
    pub(crate) struct RdbBuilder {
        out: Cursor<Vec<u8>>,
        roots_at: u64,
    }

    impl RdbBuilder {
        pub(crate) fn new(width: u32, height: u32) -> Self {
            let mut out = Cursor::new(Vec::new());
            RdbHeader {
                width,
                height,
                object_root_offset: OBJECT_SECTION_OFFSET,
                ..Default::default()
            }
            .write(&mut out)
            .unwrap();

            let mut reference = ModelReference::default();
            reference.model_id.copy_from_slice(b"43000");
            reference.description.copy_from_slice(b"DOR");
            reference.write(&mut out).unwrap();
            for _ in 1..MODEL_REFERENCE_COUNT {
                ModelReference::default().write(&mut out).unwrap();
            }
            for _ in 0..MODEL_REFERENCE_COUNT {
                0u32.write_le(&mut out).unwrap();
            }
            ObjectSectionHeader::default().write(&mut out).unwrap();

            let roots_at = out.position();
            for _ in 0..width * height {
                (-1i32).write_le(&mut out).unwrap();
            }

            Self { out, roots_at }
        }

        pub(crate) fn position(&self) -> i32 {
            self.out.get_ref().len() as i32
        }

        pub(crate) fn set_root(&mut self, cell: usize, offset: i32) {
            self.out
                .seek(SeekFrom::Start(self.roots_at + cell as u64 * 4))
                .unwrap();
            offset.write_le(&mut self.out).unwrap();
            self.out.seek(SeekFrom::End(0)).unwrap();
        }

        /// Append a node with its resource and return the node offset
        pub(crate) fn node(
            &mut self,
            next: i32,
            previous: i32,
            resource_type: u8,
            resource: &[u8],
        ) -> i32 {
            let offset = self.position();
            ObjectNode {
                next,
                previous,
                x: offset,
                y: 0,
                z: -offset,
                resource_type,
                resource_offset: (offset + 25) as u32,
            }
            .write(&mut self.out)
            .unwrap();
            std::io::Write::write_all(&mut self.out, resource).unwrap();
            offset
        }

        pub(crate) fn finish(self) -> Vec<u8> {
            self.out.into_inner()
        }
    }

    fn light() -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        RdbLight {
            radius: 12,
            ..Default::default()
        }
        .write(&mut out)
        .unwrap();
        out.into_inner()
    }

    fn flat() -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        RdbFlat {
            texture_bitfield: (199 << 7) | 4,
            ..Default::default()
        }
        .write(&mut out)
        .unwrap();
        out.into_inner()
    }

    const LIGHT_NODE: i32 = 25 + 10;

    #[traced_test]
    #[test]
    fn five_node_chain_is_visited_once() -> Result<()> {
        let mut builder = RdbBuilder::new(2, 1);
        let first = builder.position();

        let mut offset = first;
        let mut previous = -1;
        for i in 0..5 {
            let next = if i == 4 { -1 } else { offset + LIGHT_NODE };
            builder.node(next, previous, 0x02, &light());
            previous = offset;
            offset += LIGHT_NODE;
        }
        builder.set_root(1, first);

        let data = builder.finish();
        let block = RdbBlock::decode(&mut RecordView::new(&data), "N0000001.RDB")?;

        assert_eq!(block.letter, RdbBlockLetter::Normal);
        assert_eq!(block.roots.len(), 2);
        assert!(block.roots[0].objects.is_empty());
        assert_eq!(block.roots[1].objects, 0..5);
        assert_eq!(block.objects.len(), 5);

        let chain = block.objects_for(&block.roots[1]);
        assert!(chain.last().unwrap().next_offset < 0);
        assert_eq!(chain.last().unwrap().next, None);
        assert_eq!(chain[0].previous, None);
        assert_eq!(chain[2].next, Some(3));
        assert_eq!(chain[2].previous, Some(1));
        let expected = RdbResource::Light(RdbLight {
            radius: 12,
            ..Default::default()
        });
        assert!(chain.iter().all(|o| o.resource == expected));

        Ok(())
    }

    #[test]
    fn shared_list_heads_share_arena_objects() -> Result<()> {
        let mut builder = RdbBuilder::new(3, 1);
        let first = builder.position();
        builder.node(first + LIGHT_NODE, -1, 0x02, &light());
        builder.node(-1, first, 0x02, &light());
        builder.set_root(0, first);
        builder.set_root(2, first);

        let data = builder.finish();
        let block = RdbBlock::decode(&mut RecordView::new(&data), "N0000002.RDB")?;

        assert_eq!(block.objects.len(), 2);
        assert_eq!(block.roots[0].objects, 0..2);
        assert!(block.roots[1].objects.is_empty());
        assert_eq!(block.roots[2].objects, 0..2);
        assert_eq!(block.objects[0].next, Some(1));

        Ok(())
    }

    #[traced_test]
    #[test]
    fn model_actions_resolve_to_arena_indices() -> Result<()> {
        let mut builder = RdbBuilder::new(1, 1);
        let model_node = builder.position();
        let flat_node = model_node + 25 + 23 + 10;

        let action_offset = model_node + 25 + 23;
        let mut resource = Cursor::new(Vec::new());
        ModelResource {
            y_rotation: 512,
            model_index: 0,
            action_offset,
            ..Default::default()
        }
        .write(&mut resource)
        .unwrap();
        ActionResource {
            axis: 2,
            duration: 30,
            magnitude: 128,
            next_object_offset: flat_node,
            flags: 0,
        }
        .write(&mut resource)
        .unwrap();

        builder.node(flat_node, -1, 0x01, &resource.into_inner());
        builder.node(-1, model_node, 0x03, &flat());
        builder.set_root(0, model_node);

        let data = builder.finish();
        let block = RdbBlock::decode(&mut RecordView::new(&data), "S0000999.RDB")?;

        assert_eq!(block.objects.len(), 2);
        let RdbResource::Model(model) = &block.objects[0].resource else {
            panic!("expected a model, found {:?}", block.objects[0].resource);
        };
        assert_eq!(model.rotation.y, 512);
        assert_eq!(block.model_id(model.model_index), Some(43000));
        assert_eq!(block.model_references[0].description(), "DOR");

        let action = model.action.as_ref().unwrap();
        assert_eq!(action.next_object, Some(1));
        assert_eq!(action.duration, 30);

        let RdbResource::Flat(flat) = &block.objects[1].resource else {
            panic!("expected a flat");
        };
        assert_eq!(flat.texture().archive, 199);
        assert_eq!(block.objects[1].previous, Some(0));

        Ok(())
    }

    #[test]
    fn unknown_resource_type_is_fatal() {
        let mut builder = RdbBuilder::new(1, 1);
        let node = builder.node(-1, -1, 0x07, &[0u8; 16]);
        builder.set_root(0, node);

        let data = builder.finish();
        let result = RdbBlock::decode(&mut RecordView::new(&data), "N0000002.RDB");

        assert!(matches!(
            result,
            Err(Error::UnknownResourceType {
                resource_type: 0x07,
                ..
            })
        ));
    }

    #[test]
    fn object_section_must_start_at_declared_offset() {
        let mut data = RdbBuilder::new(1, 1).finish();
        data[12..16].copy_from_slice(&(OBJECT_SECTION_OFFSET + 4).to_le_bytes());

        let result = RdbBlock::decode(&mut RecordView::new(&data), "N0000003.RDB");
        assert!(result.unwrap_err().is_structural_mismatch());
    }

    #[traced_test]
    #[test]
    fn cyclic_chain_hits_traversal_cap() {
        let mut builder = RdbBuilder::new(1, 1);
        let first = builder.position();
        builder.node(first + LIGHT_NODE, -1, 0x02, &light());
        builder.node(first, first, 0x02, &light());
        builder.set_root(0, first);

        let data = builder.finish();
        let result = RdbBlock::decode(&mut RecordView::new(&data), "N0000004.RDB");

        let error = result.unwrap_err();
        assert!(error.is_structural_mismatch());
        assert!(error.to_string().contains(&MAX_OBJECT_CHAIN.to_string()));
    }

    #[test]
    fn node_past_end_of_record_fails() {
        let mut builder = RdbBuilder::new(1, 1);
        let first = builder.node(1_000_000, -1, 0x03, &flat());
        builder.set_root(0, first);

        let data = builder.finish();
        let result = RdbBlock::decode(&mut RecordView::new(&data), "N0000005.RDB");
        assert!(result.unwrap_err().is_end_of_data());
    }
}
