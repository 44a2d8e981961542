//! Stream adapters over the built-in engines

use std::io::{self, Cursor, Read, Write};

use xform_api::OperationMode;
use xform_cipher::{CipherReader, CipherWriter, ReadState, StreamConfig};
use xform_tests::{aes_key, builtin_context, cipher, gcm_spec, iv_spec};

fn sample() -> Vec<u8> {
    (0..5000u32).map(|i| (i * 7 % 251) as u8).collect()
}

#[test]
fn writer_then_reader_round_trip() {
    let ctx = builtin_context();
    let key = aes_key(16);
    let data = sample();

    let mut sealed = Vec::new();
    {
        let enc = cipher(&ctx, "AES/CBC/PKCS5Padding", OperationMode::Encrypt, &key, Some(&iv_spec(3)));
        let mut writer = CipherWriter::with_config(&mut sealed, enc, StreamConfig::default().with_chunk_size(100));
        for piece in data.chunks(333) {
            writer.write_all(piece).unwrap();
        }
        writer.close().unwrap();
    }
    assert_eq!(sealed.len(), (data.len() / 16 + 1) * 16);

    let dec = cipher(&ctx, "AES/CBC/PKCS5Padding", OperationMode::Decrypt, &key, Some(&iv_spec(3)));
    let mut reader = CipherReader::with_config(Cursor::new(sealed), dec, StreamConfig::default().with_chunk_size(64));
    let mut plain = Vec::new();
    reader.read_to_end(&mut plain).unwrap();
    assert_eq!(plain, data);
    assert_eq!(reader.state(), ReadState::Exhausted);
}

#[test]
fn gcm_reader_reports_tag_failure_at_end_of_stream() {
    let ctx = builtin_context();
    let key = aes_key(16);
    let mut enc = cipher(&ctx, "AES/GCM/NoPadding", OperationMode::Encrypt, &key, Some(&gcm_spec(1)));
    let mut sealed = enc.finalize_with(&sample()).unwrap();
    sealed[100] ^= 1;

    let dec = cipher(&ctx, "AES/GCM/NoPadding", OperationMode::Decrypt, &key, Some(&gcm_spec(1)));
    let mut reader = CipherReader::new(&sealed[..], dec);
    let mut plain = Vec::new();
    let err = reader.read_to_end(&mut plain).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    // nothing was released before the tag check
    assert!(plain.is_empty());
}

#[test]
fn abandoned_gcm_reader_discards_the_failure_unless_verifying() {
    let ctx = builtin_context();
    let key = aes_key(16);
    let mut enc = cipher(&ctx, "AES/GCM/NoPadding", OperationMode::Encrypt, &key, Some(&gcm_spec(2)));
    let sealed = enc.finalize_with(&sample()).unwrap();

    // closing before reading finalizes an empty, unauthenticated message
    let dec = cipher(&ctx, "AES/GCM/NoPadding", OperationMode::Decrypt, &key, Some(&gcm_spec(2)));
    let mut reader = CipherReader::new(&sealed[..], dec);
    reader.close().unwrap();
    assert_eq!(reader.state(), ReadState::Exhausted);
    assert_eq!(reader.read(&mut [0u8; 4]).unwrap(), 0);

    let dec = cipher(&ctx, "AES/GCM/NoPadding", OperationMode::Decrypt, &key, Some(&gcm_spec(2)));
    let mut strict = CipherReader::with_config(&sealed[..], dec, StreamConfig::default().verify_on_close(true));
    assert_eq!(strict.close().unwrap_err().kind(), io::ErrorKind::InvalidData);
}

#[test]
fn ctr_reader_streams_as_it_reads() {
    let ctx = builtin_context();
    let key = aes_key(32);
    let data = sample();
    let enc = cipher(&ctx, "AES/CTR/NoPadding", OperationMode::Encrypt, &key, Some(&iv_spec(7)));
    let mut reader = CipherReader::with_config(&data[..], enc, StreamConfig::default().with_chunk_size(50));

    let mut head = [0u8; 10];
    reader.read_exact(&mut head).unwrap();
    assert_eq!(reader.pending(), 40);
    let mut rest = Vec::new();
    reader.read_to_end(&mut rest).unwrap();

    let mut dec = cipher(&ctx, "AES/CTR/NoPadding", OperationMode::Decrypt, &key, Some(&iv_spec(7)));
    let sealed = [&head[..], &rest[..]].concat();
    assert_eq!(dec.finalize_with(&sealed).unwrap(), data);
}

#[test]
fn dropping_a_writer_finalizes() {
    let ctx = builtin_context();
    let key = aes_key(16);
    let mut sealed = Vec::new();
    {
        let enc = cipher(&ctx, "AES/ECB/PKCS5Padding", OperationMode::Encrypt, &key, None);
        let mut writer = CipherWriter::new(&mut sealed, enc);
        writer.write_all(b"dropped, not closed").unwrap();
    }
    assert_eq!(sealed.len(), 32);

    let mut dec = cipher(&ctx, "AES/ECB/PKCS5Padding", OperationMode::Decrypt, &key, None);
    assert_eq!(dec.finalize_with(&sealed).unwrap(), b"dropped, not closed");
}
