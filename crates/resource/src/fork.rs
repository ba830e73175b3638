//! Resource-fork container: the three-region on-disk layout, the resource
//! index it builds, and the lookup contract callers use to reach individual
//! resources.

use std::collections::BTreeMap;

use rsrc_errors::Error;
use rsrc_io::{OutOfRange, Reader};

use crate::dispatch::{self, DecompressionFlag, DecompressionFlags};

/// A four-character big-endian resource type tag, e.g. `*b"snd "`.
pub type ResourceType = [u8; 4];

/// Render a resource type tag the way classic Mac tools print it, with
/// trailing spaces kept verbatim (`"snd "`, not `"snd"`).
pub fn type_name(resource_type: ResourceType) -> String {
    resource_type.iter().map(|&byte| byte as char).collect()
}

fn oor(error: OutOfRange) -> Error {
    Error::OutOfRange(error.offset, error.needed, error.len)
}

/// A bounds-checked sub-slice from `start` to the end of `bytes`, used to
/// hand each nested table (type list, reference list, name list, data
/// entry) its own `Reader` without re-deriving a length every time.
fn tail(bytes: &[u8], start: usize) -> Result<&[u8], Error> {
    bytes.get(start..).ok_or(Error::OutOfRange(start, 0, bytes.len()))
}

/// One entry in a resource fork: a typed, numbered, optionally-named blob.
#[derive(Debug, Clone)]
pub struct Resource {
    /// Four-character type tag.
    pub kind: ResourceType,
    /// Signed 16-bit id, unique within `kind`.
    pub id: i16,
    /// Optional Pascal-string name.
    pub name: Option<Vec<u8>>,
    /// Raw storage-attribute flags (bit 0 = compressed, bit 8 = decompression
    /// failed, bit 9 = decompressed in memory, remaining bits are legacy
    /// attributes this library only preserves).
    pub attributes: u8,
    /// The resource's payload. Starts as the on-disk bytes; replaced in
    /// place by [`ResourceFile::get_resource`] the first time a compressed
    /// resource is successfully decompressed.
    pub data: Vec<u8>,
    /// Cache bit: the sticky "decompressed in memory" flag (wire bit 9, not
    /// representable in the 8-bit on-wire attribute byte).
    pub(crate) decompressed: bool,
    /// Cache bit: the sticky "decompression previously failed" flag (wire
    /// bit 8), which prevents retrying a failed decompression.
    pub(crate) decompression_failed: bool,
}

const FLAG_COMPRESSED: u8 = 0x01;

impl Resource {
    /// `true` if this resource's on-disk payload is compressed and has not
    /// yet been successfully decompressed.
    pub fn is_compressed(&self) -> bool {
        self.attributes & FLAG_COMPRESSED != 0 && !self.decompression_failed()
    }

    /// `true` if a previous decompression attempt for this resource failed;
    /// the sticky bit that prevents retrying.
    pub fn decompression_failed(&self) -> bool {
        self.decompression_failed
    }

    fn mark_decompressed(&mut self, bytes: Vec<u8>) {
        self.data = bytes;
        self.attributes &= !FLAG_COMPRESSED;
        self.decompressed = true;
    }

    fn mark_decompression_failed(&mut self) {
        self.decompression_failed = true;
    }
}

/// 48-bit `(type, id)` composite key; resources of the same type sort
/// contiguously by ascending id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ResourceKey {
    kind: ResourceType,
    id: i16,
}

impl ResourceKey {
    fn new(kind: ResourceType, id: i16) -> Self {
        Self { kind, id }
    }
}

/// A parsed (or hand-assembled) collection of resources, indexed by
/// `(type, id)` and by name.
#[derive(Debug, Default)]
pub struct ResourceFile {
    resources: BTreeMap<ResourceKey, Resource>,
    name_index: BTreeMap<(ResourceType, Vec<u8>), ResourceKey>,
}

impl ResourceFile {
    /// An empty fork.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pre-existing resource, indexing it by key and, if named, by
    /// name. Used both by [`Self::parse`] and by callers wrapping
    /// individually-constructed resources.
    pub fn insert(&mut self, resource: Resource) {
        let key = ResourceKey::new(resource.kind, resource.id);

        if let Some(name) = &resource.name {
            self.name_index.insert((resource.kind, name.clone()), key);
        }

        self.resources.insert(key, resource);
    }

    /// Parse a whole resource fork from its raw bytes. Empty input produces
    /// a valid, empty fork.
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.is_empty() {
            return Ok(Self::new());
        }

        let mut reader = Reader::new(bytes);

        let data_offset = reader.get_u32be().map_err(oor)?;
        let map_offset = reader.get_u32be().map_err(oor)?;
        let _data_size = reader.get_u32be().map_err(oor)?;
        let map_size = reader.get_u32be().map_err(oor)?;

        if map_offset as usize + 28 > bytes.len() {
            return Err(Error::MalformedContainer("map header extends past the end of the fork".into()));
        }
        if map_size == 0 {
            return Err(Error::MalformedContainer("resource map size is zero".into()));
        }

        reader.go_to(map_offset as usize + 24).map_err(oor)?;
        let type_list_offset = reader.get_u16be().map_err(oor)?;
        let name_list_offset = reader.get_u16be().map_err(oor)?;

        let type_list_base = map_offset as usize + type_list_offset as usize;
        let mut type_reader = Reader::new(tail(bytes, type_list_base)?);

        let raw_type_count = type_reader.get_u16be().map_err(oor)?;
        let type_count = if raw_type_count == 0xFFFF { 0 } else { raw_type_count as u32 + 1 };

        let mut file = Self::new();

        for _ in 0..type_count {
            let kind: ResourceType = {
                let bytes = type_reader.get_bytes(4).map_err(oor)?;
                [bytes[0], bytes[1], bytes[2], bytes[3]]
            };
            let raw_ref_count = type_reader.get_u16be().map_err(oor)?;
            let ref_count = if raw_ref_count == 0xFFFF { 0 } else { raw_ref_count as u32 + 1 };
            let ref_list_offset = type_reader.get_u16be().map_err(oor)?;

            let ref_list_base = type_list_base + ref_list_offset as usize;
            let mut ref_reader = Reader::new(tail(bytes, ref_list_base)?);

            for _ in 0..ref_count {
                let id = ref_reader.get_i16be().map_err(oor)?;
                let name_offset = ref_reader.get_u16be().map_err(oor)?;
                let attributes_and_offset = ref_reader.get_u32be().map_err(oor)?;
                let _reserved = ref_reader.get_u32be().map_err(oor)?;

                let attributes = (attributes_and_offset >> 24) as u8;
                let data_entry_offset = attributes_and_offset & 0x00FF_FFFF;

                let name = if name_offset == 0xFFFF {
                    None
                } else {
                    let name_base = map_offset as usize + name_list_offset as usize + name_offset as usize;
                    let mut name_reader =
                        Reader::new(tail(bytes, name_base)?);
                    Some(name_reader.get_pascal_string().map_err(oor)?.to_vec())
                };

                let data_base = data_offset as usize + data_entry_offset as usize;
                let mut data_reader =
                    Reader::new(tail(bytes, data_base)?);
                let data_len = data_reader.get_u32be().map_err(oor)?;
                let data = data_reader.get_bytes(data_len as usize).map_err(oor)?.to_vec();

                file.insert(Resource {
                    kind,
                    id,
                    name,
                    attributes,
                    data,
                    decompressed: false,
                    decompression_failed: false,
                });
            }
        }

        Ok(file)
    }

    /// Whether a resource of `(kind, id)` exists.
    pub fn resource_exists(&self, kind: ResourceType, id: i16) -> bool {
        self.resources.contains_key(&ResourceKey::new(kind, id))
    }

    /// Whether a resource of `(kind, name)` exists.
    pub fn resource_exists_by_name(&self, kind: ResourceType, name: &[u8]) -> bool {
        self.name_index.contains_key(&(kind, name.to_vec()))
    }

    /// Fetch a resource by `(kind, id)`, running the decompression
    /// dispatcher on first access if it is flagged compressed and `flags`
    /// does not disable dispatching entirely.
    pub fn get_resource(&mut self, kind: ResourceType, id: i16, flags: DecompressionFlags) -> Result<&Resource, Error> {
        let key = ResourceKey::new(kind, id);

        if !self.resources.contains_key(&key) {
            return Err(Error::NotFound(format!("{}:{id}", type_name(kind))));
        }

        self.maybe_decompress(key, flags)?;

        Ok(self.resources.get(&key).expect("checked above"))
    }

    /// Fetch a resource by `(kind, name)`.
    pub fn get_resource_by_name(&mut self, kind: ResourceType, name: &[u8], flags: DecompressionFlags) -> Result<&Resource, Error> {
        let key = *self
            .name_index
            .get(&(kind, name.to_vec()))
            .ok_or_else(|| Error::NotFound(format!("{}:{}", type_name(kind), String::from_utf8_lossy(name))))?;

        self.maybe_decompress(key, flags)?;

        Ok(self.resources.get(&key).expect("checked above"))
    }

    fn maybe_decompress(&mut self, key: ResourceKey, flags: DecompressionFlags) -> Result<(), Error> {
        let needs_attempt = {
            let resource = self.resources.get(&key).expect("caller checked existence");
            resource.is_compressed() && !flags.contains(DecompressionFlag::Disabled)
        };

        if !needs_attempt {
            return Ok(());
        }

        let outcome = {
            let resource = self.resources.get(&key).expect("checked above");
            dispatch::decompress(self, resource, flags)
        };

        let resource = self.resources.get_mut(&key).expect("checked above");

        match outcome {
            Ok(bytes) => {
                resource.mark_decompressed(bytes);
                Ok(())
            }
            Err(error) => {
                resource.mark_decompression_failed();
                Err(error)
            }
        }
    }

    /// All ids of resources of `kind`, in strictly ascending order.
    pub fn all_resources_of_type(&self, kind: ResourceType) -> Vec<i16> {
        self.resources
            .range(ResourceKey::new(kind, i16::MIN)..=ResourceKey::new(kind, i16::MAX))
            .map(|(key, _)| key.id)
            .collect()
    }

    /// All `(type, id)` pairs, in ascending lexicographic order.
    pub fn all_resources(&self) -> Vec<(ResourceType, i16)> {
        self.resources.keys().map(|key| (key.kind, key.id)).collect()
    }

    /// Find the first type (in `types` order) for which `(type, id)`
    /// exists.
    pub fn find_resource_by_id(&self, id: i16, types: &[ResourceType]) -> Result<ResourceType, Error> {
        types
            .iter()
            .copied()
            .find(|&kind| self.resource_exists(kind, id))
            .ok_or_else(|| Error::NotFound(format!("id {id} in any of {} type(s)", types.len())))
    }

    /// Borrow a resource without triggering decompression, used by the
    /// dispatcher to look up candidate decompressors inside the same fork.
    pub(crate) fn peek_resource(&self, kind: ResourceType, id: i16) -> Option<&Resource> {
        self.resources.get(&ResourceKey::new(kind, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_fork() {
        let file = ResourceFile::parse(&[]).unwrap();

        assert!(file.all_resources().is_empty());
        assert!(!file.resource_exists(*b"TEXT", 128));
    }

    fn build_minimal_fork() -> Vec<u8> {
        // One resource: type "TEST", id 128, name "hi", payload b"ab".
        let header_size = 16u32;
        let data = [0u8, 0, 0, 2, b'a', b'b']; // 4-byte BE length + payload
        let data_offset = header_size;
        let data_size = data.len() as u32;

        let name_list = [2u8, b'h', b'i'];

        // type list: count-1 (0) + one 12-byte type entry
        let ref_list_offset_within_type_list = 2 + 12u16; // after count + one type entry
        let mut type_list = Vec::new();
        type_list.extend_from_slice(&0u16.to_be_bytes()); // count - 1 == 0 => 1 type
        type_list.extend_from_slice(b"TEST");
        type_list.extend_from_slice(&0u16.to_be_bytes()); // ref count - 1 == 0 => 1 resource
        type_list.extend_from_slice(&ref_list_offset_within_type_list.to_be_bytes());

        let mut ref_list = Vec::new();
        ref_list.extend_from_slice(&128i16.to_be_bytes()); // id
        ref_list.extend_from_slice(&0u16.to_be_bytes()); // name offset 0
        let attributes_and_offset: u32 = 0u32 << 24 | 0; // no attrs, data at offset 0 in data segment
        ref_list.extend_from_slice(&attributes_and_offset.to_be_bytes());
        ref_list.extend_from_slice(&[0u8; 4]); // reserved

        let type_list_offset = 28u16; // right after the 28-byte map header
        let name_list_offset = type_list_offset + type_list.len() as u16 + ref_list.len() as u16;

        let mut map = Vec::new();
        map.extend_from_slice(&[0u8; 24]); // reserved/handle fields
        map.extend_from_slice(&type_list_offset.to_be_bytes());
        map.extend_from_slice(&name_list_offset.to_be_bytes());
        map.extend_from_slice(&type_list);
        map.extend_from_slice(&ref_list);
        map.extend_from_slice(&name_list);

        let map_offset = header_size + data_size;
        let map_size = map.len() as u32;

        let mut fork = Vec::new();
        fork.extend_from_slice(&data_offset.to_be_bytes());
        fork.extend_from_slice(&map_offset.to_be_bytes());
        fork.extend_from_slice(&data_size.to_be_bytes());
        fork.extend_from_slice(&map_size.to_be_bytes());
        fork.extend_from_slice(&data);
        fork.extend_from_slice(&map);

        fork
    }

    #[test]
    fn test_parse_one_resource() {
        let fork = build_minimal_fork();
        let mut file = ResourceFile::parse(&fork).unwrap();

        assert!(file.resource_exists(*b"TEST", 128));
        assert_eq!(file.all_resources_of_type(*b"TEST"), vec![128]);
        assert_eq!(file.all_resources(), vec![(*b"TEST", 128)]);

        let resource = file.get_resource(*b"TEST", 128, DecompressionFlags::empty()).unwrap();
        assert_eq!(resource.data, b"ab");
        assert_eq!(resource.name, Some(b"hi".to_vec()));

        let found = file.get_resource_by_name(*b"TEST", b"hi", DecompressionFlags::empty()).unwrap();
        assert_eq!(found.data, b"ab");
    }

    #[test]
    fn test_not_found() {
        let mut file = ResourceFile::new();
        assert!(file.get_resource(*b"TEST", 1, DecompressionFlags::empty()).is_err());
    }

    #[test]
    fn test_find_resource_by_id() {
        let fork = build_minimal_fork();
        let file = ResourceFile::parse(&fork).unwrap();

        assert_eq!(file.find_resource_by_id(128, &[*b"ABCD", *b"TEST"]).unwrap(), *b"TEST");
        assert!(file.find_resource_by_id(999, &[*b"TEST"]).is_err());
    }
}
