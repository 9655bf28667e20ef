//! Black-box link-engine scenarios, built as in-memory datasets rather than
//! fixture files on disk (no on-disk COS tapes to check in).

extern crate craylink;

use craylink::dataset::DatasetWriter;
use craylink::link::{BuildStamp, InputFile, LinkEngine};
use craylink::loader::{
    BlockDescriptor, BlockLocation, BlockTypeCode, Brt, BrtBody, BrtExtendedEntry, Dft, DftModule, EntryDescriptor,
    Pdt, PdtHeaderEntry, Trailer, Txt, Xrt, XrtEntry, HEADER_ENTRY_MAGIC,
};
use craylink::{Ident, ParseOptions};
use std::io::Cursor;

fn stamp() -> BuildStamp {
    BuildStamp {
        date: Ident::from("01/01/86"),
        time: Ident::from("00:00:00"),
        linker_name: Ident::from("CRAYLINK"),
        linker_version: Ident::from("0.1.0"),
    }
}

fn trailer_stub() -> Trailer {
    Trailer {
        date: Ident::from("01/01/86"),
        time: Ident::from("00:00:00"),
        os_identifier: Ident::from("COS"),
        linker_name: Ident::from("FTNCMP"),
        linker_version: Ident::from("1.0"),
        comment: String::new(),
    }
}

/// Packs loader-table byte groups into one single-record dataset, the shape
/// every scenario below feeds to `LinkEngine::link`.
fn dataset_of(parts: &[Vec<u8>]) -> Box<dyn InputFile> {
    let mut buf = Vec::new();
    {
        let cursor = Cursor::new(&mut buf);
        let mut w = DatasetWriter::new(cursor).unwrap();
        for part in parts {
            w.write(part).unwrap();
        }
        w.write_eor().unwrap();
        w.write_eod().unwrap();
    }
    Box::new(Cursor::new(buf))
}

fn word_at(image: &[u8], byte_offset: usize) -> u64 {
    u64::from_be_bytes(image[byte_offset..byte_offset + 8].try_into().unwrap())
}

#[test]
fn links_single_module_with_primary_entry() {
    let pdt = Pdt {
        header: PdtHeaderEntry { module_name: Ident::from("MAIN"), absolute: true, machine_extensions: HEADER_ENTRY_MAGIC },
        blocks: vec![BlockDescriptor {
            name: Ident::from("CODE"),
            absolute: true,
            error: false,
            length: 1,
            origin: 0o200,
            block_type: BlockTypeCode::Code,
            location: BlockLocation::CentralMemory,
        }],
        entries: vec![EntryDescriptor { name: Ident::from("MAIN"), primary: true, parcel_address: true, value: 0o200 * 4 }],
        externals: Vec::new(),
        trailer: trailer_stub(),
    };
    let txt = Txt { dest_block_index: 0, load_addr: 0o200, words: vec![0x0040_0000_0000_0000u64] };

    let input = dataset_of(&[pdt.emit(), txt.emit()]);
    let out = LinkEngine::new(ParseOptions::strict()).link(vec![input], stamp()).unwrap();

    assert!(out.is_successful(), "{:?}", out.errors);
    assert_eq!(out.load_map.hlm, 0o200 + 1);
    let start = out.load_map.start_address.expect("expected a resolved start address");
    assert_eq!(start.word, 0o200);
    assert_eq!(start.parcel, 0);
    assert_eq!(word_at(&out.image, 0o200 * 8), 0x0040_0000_0000_0000u64);
}

#[test]
fn brt_extended_entry_relocates_a_full_word_field() {
    let pdt = Pdt {
        header: PdtHeaderEntry { module_name: Ident::from("RELOC"), absolute: false, machine_extensions: HEADER_ENTRY_MAGIC },
        blocks: vec![BlockDescriptor {
            name: Ident::from("B"),
            absolute: false,
            error: false,
            length: 1,
            origin: 0,
            block_type: BlockTypeCode::Code,
            location: BlockLocation::CentralMemory,
        }],
        entries: Vec::new(),
        externals: Vec::new(),
        trailer: trailer_stub(),
    };
    let txt = Txt { dest_block_index: 0, load_addr: 0, words: vec![0x10] };
    // field_width_code 0 means the full 64-bit word; bit_address 63 names
    // the rightmost bit of word 0 of the block (this crate's own "bit 0 is
    // the leftmost bit" convention, see `bitfield` doc comments).
    let brt = Brt {
        body: BrtBody::Extended(vec![BrtExtendedEntry {
            block_index: 0,
            field_width_code: 0,
            parcel_flag: false,
            negative_flag: false,
            bit_address: 63,
        }]),
    };

    let input = dataset_of(&[pdt.emit(), txt.emit(), brt.emit()]);
    let out = LinkEngine::new(ParseOptions::strict()).link(vec![input], stamp()).unwrap();

    assert!(out.is_successful(), "{:?}", out.errors);
    let base = out.load_map.modules[0].blocks[0].base_address;
    assert_eq!(base, 0o200);
    assert_eq!(word_at(&out.image, base as usize * 8), 0x10 + base as u64);
}

#[test]
fn xrt_entry_converts_parcel_symbol_into_a_word_field() {
    let obj_pdt = Pdt {
        header: PdtHeaderEntry { module_name: Ident::from("MAINOBJ"), absolute: false, machine_extensions: HEADER_ENTRY_MAGIC },
        blocks: vec![BlockDescriptor {
            name: Ident::from("C"),
            absolute: false,
            error: false,
            length: 1,
            origin: 0,
            block_type: BlockTypeCode::Code,
            location: BlockLocation::CentralMemory,
        }],
        entries: Vec::new(),
        externals: vec![Ident::from("SUB")],
        trailer: trailer_stub(),
    };
    let obj_txt = Txt { dest_block_index: 0, load_addr: 0, words: vec![0] };
    let obj_xrt = Xrt {
        entries: vec![XrtEntry { block_index: 0, parcel_flag: false, external_index: 0, field_width_code: 22, bit_address: 63 }],
    };
    let obj_input = dataset_of(&[obj_pdt.emit(), obj_txt.emit(), obj_xrt.emit()]);

    let lib_pdt = Pdt {
        header: PdtHeaderEntry { module_name: Ident::from("LIBMOD"), absolute: true, machine_extensions: HEADER_ENTRY_MAGIC },
        blocks: vec![BlockDescriptor {
            name: Ident::from("X"),
            absolute: true,
            error: false,
            length: 1,
            origin: 0,
            block_type: BlockTypeCode::Code,
            location: BlockLocation::CentralMemory,
        }],
        entries: vec![EntryDescriptor { name: Ident::from("SUB"), primary: false, parcel_address: true, value: 0o1000 }],
        externals: Vec::new(),
        trailer: trailer_stub(),
    };
    let dft = Dft {
        modules: vec![DftModule {
            name: Ident::from("LIBMOD"),
            blocks: vec![Ident::from("X")],
            entries: vec![Ident::from("SUB")],
            externals: Vec::new(),
        }],
    };
    let lib_input = dataset_of(&[dft.emit(), lib_pdt.emit()]);

    let out = LinkEngine::new(ParseOptions::strict()).link(vec![obj_input, lib_input], stamp()).unwrap();

    assert!(out.is_successful(), "{:?}", out.errors);
    assert_eq!(out.load_map.modules.len(), 2);
    let base = out.load_map.modules[0].blocks[0].base_address;
    // symbol carries a parcel address (0o1000); the field is word-scaled,
    // so the patched value is the symbol's word address (value >> 2).
    assert_eq!(word_at(&out.image, base as usize * 8), 0o1000u64 >> 2);
}

#[test]
fn library_module_is_pulled_in_transitively() {
    let obj_pdt = Pdt {
        header: PdtHeaderEntry { module_name: Ident::from("MAINOBJ"), absolute: false, machine_extensions: HEADER_ENTRY_MAGIC },
        blocks: Vec::new(),
        entries: Vec::new(),
        externals: vec![Ident::from("X")],
        trailer: trailer_stub(),
    };
    let obj_input = dataset_of(&[obj_pdt.emit()]);

    let m1_pdt = Pdt {
        header: PdtHeaderEntry { module_name: Ident::from("M1"), absolute: false, machine_extensions: HEADER_ENTRY_MAGIC },
        blocks: Vec::new(),
        entries: vec![EntryDescriptor { name: Ident::from("X"), primary: false, parcel_address: false, value: 0 }],
        externals: vec![Ident::from("Y")],
        trailer: trailer_stub(),
    };
    let m2_pdt = Pdt {
        header: PdtHeaderEntry { module_name: Ident::from("M2"), absolute: false, machine_extensions: HEADER_ENTRY_MAGIC },
        blocks: Vec::new(),
        entries: vec![EntryDescriptor { name: Ident::from("Y"), primary: false, parcel_address: false, value: 0 }],
        externals: Vec::new(),
        trailer: trailer_stub(),
    };
    let dft = Dft {
        modules: vec![
            DftModule { name: Ident::from("M1"), blocks: Vec::new(), entries: vec![Ident::from("X")], externals: vec![Ident::from("Y")] },
            DftModule { name: Ident::from("M2"), blocks: Vec::new(), entries: vec![Ident::from("Y")], externals: Vec::new() },
        ],
    };
    let lib_input = dataset_of(&[dft.emit(), m1_pdt.emit(), m2_pdt.emit()]);

    let out = LinkEngine::new(ParseOptions::strict()).link(vec![obj_input, lib_input], stamp()).unwrap();

    assert!(out.is_successful(), "{:?}", out.errors);
    assert_eq!(out.load_map.modules.len(), 3);
    let names: Vec<String> = out.load_map.modules.iter().map(|m| m.name.trimmed().to_string()).collect();
    assert!(names.contains(&"MAINOBJ".to_string()));
    assert!(names.contains(&"M1".to_string()));
    assert!(names.contains(&"M2".to_string()), "M2 should be pulled in transitively via M1's reference to Y");
}

#[test]
fn duplicate_entry_point_is_reported_and_first_wins() {
    let a = Pdt {
        header: PdtHeaderEntry { module_name: Ident::from("A"), absolute: false, machine_extensions: HEADER_ENTRY_MAGIC },
        blocks: vec![BlockDescriptor {
            name: Ident::from("BA"),
            absolute: false,
            error: false,
            length: 1,
            origin: 0,
            block_type: BlockTypeCode::Code,
            location: BlockLocation::CentralMemory,
        }],
        entries: vec![EntryDescriptor { name: Ident::from("FOO"), primary: true, parcel_address: false, value: 0 }],
        externals: Vec::new(),
        trailer: trailer_stub(),
    };
    let b = Pdt {
        header: PdtHeaderEntry { module_name: Ident::from("B"), absolute: false, machine_extensions: HEADER_ENTRY_MAGIC },
        blocks: vec![BlockDescriptor {
            name: Ident::from("BB"),
            absolute: false,
            error: false,
            length: 1,
            origin: 0,
            block_type: BlockTypeCode::Code,
            location: BlockLocation::CentralMemory,
        }],
        entries: vec![EntryDescriptor { name: Ident::from("FOO"), primary: true, parcel_address: false, value: 0 }],
        externals: Vec::new(),
        trailer: trailer_stub(),
    };

    let out = LinkEngine::new(ParseOptions::strict())
        .link(vec![dataset_of(&[a.emit()]), dataset_of(&[b.emit()])], stamp())
        .unwrap();

    assert!(!out.is_successful());
    assert_eq!(out.load_map.modules.len(), 2);
    assert!(out.errors.iter().any(|e| matches!(
        e,
        craylink::error::LinkError::DuplicateEntry { name } if name == "FOO"
    )));
}

#[test]
fn unsatisfied_external_is_reported_and_field_left_unpatched() {
    let pdt = Pdt {
        header: PdtHeaderEntry { module_name: Ident::from("LONER"), absolute: false, machine_extensions: HEADER_ENTRY_MAGIC },
        blocks: vec![BlockDescriptor {
            name: Ident::from("D"),
            absolute: false,
            error: false,
            length: 1,
            origin: 0,
            block_type: BlockTypeCode::Code,
            location: BlockLocation::CentralMemory,
        }],
        entries: Vec::new(),
        externals: vec![Ident::from("BAR")],
        trailer: trailer_stub(),
    };
    let txt = Txt { dest_block_index: 0, load_addr: 0, words: vec![0x1234] };
    let xrt = Xrt {
        entries: vec![XrtEntry { block_index: 0, parcel_flag: false, external_index: 0, field_width_code: 8, bit_address: 63 }],
    };

    let input = dataset_of(&[pdt.emit(), txt.emit(), xrt.emit()]);
    let out = LinkEngine::new(ParseOptions::strict()).link(vec![input], stamp()).unwrap();

    assert!(!out.is_successful());
    assert!(out.errors.iter().any(|e| matches!(
        e,
        craylink::error::LinkError::UnsatisfiedExternal { name, referencing_module }
            if name == "BAR" && referencing_module == "LONER"
    )));
    let base = out.load_map.modules[0].blocks[0].base_address;
    assert_eq!(word_at(&out.image, base as usize * 8), 0x1234, "field must be left untouched when the external never resolves");
}
