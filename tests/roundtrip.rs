//! End-to-end tests for the streaming sessions and the buffer/file helpers.

use lzstream::{
    compress_buffer, compress_file, decompress_buffer, decompress_file, Decoder, Encoder,
    EncoderOptions, Error, FileEncoder,
};

/// Deterministic, mildly compressible payload.
fn sample_payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Deterministic payload that LZMA cannot compress, for member-split tests.
fn incompressible_payload(len: usize) -> Vec<u8> {
    let mut state = 0x9e3779b97f4a7c15u64;
    let mut data = Vec::with_capacity(len + 8);
    while data.len() < len {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        data.extend_from_slice(&state.to_le_bytes());
    }
    data.truncate(len);
    data
}

fn compress_chunked(payload: &[u8], chunk_size: usize) -> Vec<u8> {
    let mut encoder = Encoder::new().unwrap();
    let mut compressed = Vec::new();
    for chunk in payload.chunks(chunk_size) {
        compressed.extend_from_slice(&encoder.compress(chunk).unwrap());
    }
    compressed.extend_from_slice(&encoder.finish().unwrap());
    compressed
}

fn decompress_chunked(compressed: &[u8], chunk_size: usize, word_size: usize) -> Vec<u8> {
    let mut decoder = Decoder::with_word_size(word_size).unwrap();
    let mut decoded = Vec::new();
    for chunk in compressed.chunks(chunk_size) {
        decoded.extend_from_slice(&decoder.decompress(chunk).unwrap());
    }
    let (aligned, remainder) = decoder.finish().unwrap();
    decoded.extend_from_slice(&aligned);
    decoded.extend_from_slice(&remainder);
    decoded
}

#[test]
fn single_call_round_trip() {
    let mut encoder = Encoder::new().unwrap();
    let mut compressed = encoder.compress(b"abcdef").unwrap();
    compressed.extend_from_slice(&encoder.finish().unwrap());

    let mut decoder = Decoder::new().unwrap();
    let mut decoded = decoder.decompress(&compressed).unwrap();
    let (aligned, remainder) = decoder.finish().unwrap();
    decoded.extend_from_slice(&aligned);
    assert_eq!(decoded, b"abcdef");
    assert!(remainder.is_empty());
}

#[test]
fn multi_chunk_round_trip() {
    let payload = sample_payload(100_000);
    let compressed = compress_chunked(&payload, 13_001);
    assert!(compressed.len() < payload.len());
    let decoded = decompress_chunked(&compressed, 4_099, 1);
    assert_eq!(decoded, payload);
}

#[test]
fn chunking_does_not_change_the_output() {
    let payload = sample_payload(10_000);

    let whole = compress_chunked(&payload, payload.len());
    let byte_by_byte = compress_chunked(&payload, 1);
    assert_eq!(whole, byte_by_byte);

    let decoded_whole = decompress_chunked(&whole, whole.len(), 1);
    let decoded_byte_by_byte = decompress_chunked(&whole, 1, 1);
    assert_eq!(decoded_whole, payload);
    assert_eq!(decoded_byte_by_byte, payload);
}

#[test]
fn word_size_aligns_every_returned_chunk() {
    let word_size = 4;
    let payload = sample_payload(10_007);
    let compressed = compress_chunked(&payload, 1 << 14);

    let mut decoder = Decoder::with_word_size(word_size).unwrap();
    let mut decoded = Vec::new();
    for chunk in compressed.chunks(777) {
        let out = decoder.decompress(chunk).unwrap();
        assert_eq!(out.len() % word_size, 0);
        decoded.extend_from_slice(&out);
    }
    let (aligned, remainder) = decoder.finish().unwrap();
    assert_eq!(aligned.len() % word_size, 0);
    assert_eq!(remainder.len(), payload.len() % word_size);
    assert!(remainder.len() < word_size);
    decoded.extend_from_slice(&aligned);
    decoded.extend_from_slice(&remainder);
    assert_eq!(decoded, payload);
}

#[test]
fn empty_chunks_are_legal() {
    let payload = sample_payload(1_000);

    let mut encoder = Encoder::new().unwrap();
    let mut compressed = Vec::new();
    compressed.extend_from_slice(&encoder.compress(b"").unwrap());
    compressed.extend_from_slice(&encoder.compress(&payload).unwrap());
    compressed.extend_from_slice(&encoder.compress(b"").unwrap());
    compressed.extend_from_slice(&encoder.finish().unwrap());

    let mut decoder = Decoder::new().unwrap();
    let mut decoded = Vec::new();
    assert!(decoder.decompress(b"").unwrap().is_empty());
    decoded.extend_from_slice(&decoder.decompress(&compressed).unwrap());
    decoded.extend_from_slice(&decoder.decompress(b"").unwrap());
    let (aligned, remainder) = decoder.finish().unwrap();
    decoded.extend_from_slice(&aligned);
    assert_eq!(decoded, payload);
    assert!(remainder.is_empty());
}

#[test]
fn finish_without_input_is_clean() {
    let mut decoder = Decoder::new().unwrap();
    let (aligned, remainder) = decoder.finish().unwrap();
    assert!(aligned.is_empty());
    assert!(remainder.is_empty());

    let mut encoder = Encoder::new().unwrap();
    let tail = encoder.finish().unwrap();
    assert!(!tail.is_empty());
    assert!(decompress_buffer(&tail, 1).unwrap().is_empty());
}

#[test]
fn calls_after_finish_fail_with_a_usage_error() {
    let mut decoder = Decoder::new().unwrap();
    decoder.finish().unwrap();
    assert!(matches!(
        decoder.decompress(b"more"),
        Err(Error::Finished("decompress"))
    ));
    assert!(matches!(decoder.finish(), Err(Error::Finished("finish"))));

    let mut encoder = Encoder::new().unwrap();
    encoder.finish().unwrap();
    assert!(matches!(
        encoder.compress(b"more"),
        Err(Error::Finished("compress"))
    ));
    assert!(matches!(encoder.finish(), Err(Error::Finished("finish"))));
}

#[test]
fn zero_word_size_is_rejected() {
    assert!(matches!(
        Decoder::with_word_size(0),
        Err(Error::InvalidParameter(_))
    ));
}

#[test]
fn out_of_range_options_are_rejected() {
    assert!(matches!(
        EncoderOptions::level(10),
        Err(Error::InvalidParameter(_))
    ));
    assert!(matches!(
        Encoder::with_options(EncoderOptions::default().dictionary_size(1024)),
        Err(Error::InvalidParameter(_))
    ));
    assert!(matches!(
        Encoder::with_options(EncoderOptions::default().match_len_limit(300)),
        Err(Error::InvalidParameter(_))
    ));
    assert!(matches!(
        Encoder::with_options(EncoderOptions::default().member_size(10)),
        Err(Error::InvalidParameter(_))
    ));
}

#[test]
fn every_level_round_trips() {
    let payload = sample_payload(4_096);
    for level in 0..10 {
        let options = EncoderOptions::level(level).unwrap();
        let compressed = compress_buffer(&payload, options).unwrap();
        let decoded = decompress_buffer(&compressed, 1).unwrap();
        assert_eq!(decoded, payload, "failed at level {}", level);
    }
}

#[test]
fn corrupt_input_reports_a_data_error() {
    let mut decoder = Decoder::new().unwrap();
    let error = match decoder.decompress(&[0xff; 64]) {
        Err(error) => error,
        Ok(_) => decoder
            .finish()
            .expect_err("a corrupt stream must not finish cleanly"),
    };
    assert!(matches!(error, Error::Engine(_)));
}

#[test]
fn truncated_input_fails_at_finish() {
    let payload = sample_payload(50_000);
    let compressed = compress_buffer(&payload, EncoderOptions::default()).unwrap();
    let truncated = &compressed[..compressed.len() - 10];

    let mut decoder = Decoder::new().unwrap();
    let error = match decoder.decompress(truncated) {
        Err(error) => error,
        Ok(_) => decoder
            .finish()
            .expect_err("a truncated stream must not finish cleanly"),
    };
    assert!(matches!(error, Error::Engine(_)));
}

#[test]
fn concatenated_streams_decode_as_one() {
    let first = sample_payload(20_000);
    let second = incompressible_payload(5_000);

    let mut compressed = compress_buffer(&first, EncoderOptions::default()).unwrap();
    compressed.extend_from_slice(&compress_buffer(&second, EncoderOptions::default()).unwrap());

    let decoded = decompress_buffer(&compressed, 1).unwrap();
    let mut expected = first;
    expected.extend_from_slice(&second);
    assert_eq!(decoded, expected);
}

#[test]
fn member_size_limit_splits_the_stream() {
    let payload = incompressible_payload(300_000);
    let options = EncoderOptions::level(0).unwrap().member_size(100_000);
    let compressed = compress_buffer(&payload, options).unwrap();
    let decoded = decompress_buffer(&compressed, 1).unwrap();
    assert_eq!(decoded, payload);
}

#[test]
fn buffer_helpers_round_trip() {
    let payload = sample_payload(254);
    let compressed = compress_buffer(&payload, EncoderOptions::default()).unwrap();
    assert_eq!(decompress_buffer(&compressed, 1).unwrap(), payload);
    assert_eq!(decompress_buffer(&compressed, 2).unwrap(), payload);
}

#[test]
fn buffer_helper_rejects_a_non_dividing_word_size() {
    let payload = sample_payload(254);
    let compressed = compress_buffer(&payload, EncoderOptions::default()).unwrap();
    match decompress_buffer(&compressed, 100) {
        Err(Error::TrailingBytes {
            word_size: 100,
            remainder,
        }) => assert_eq!(remainder.len(), 54),
        other => panic!("expected a trailing-bytes error, got {:?}", other.map(|v| v.len())),
    }
}

#[test]
fn file_helpers_round_trip() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("payload.lzma");
    let payload = sample_payload(12_345);

    compress_file(&path, &payload, EncoderOptions::default()).unwrap();
    assert_eq!(decompress_file(&path, 1).unwrap(), payload);
}

#[test]
fn file_encoder_streams_chunks_to_disk() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("chunked.lzma");
    let payload = sample_payload(30_000);

    let mut encoder = FileEncoder::create(&path, EncoderOptions::default()).unwrap();
    for chunk in payload.chunks(7_001) {
        encoder.compress(chunk).unwrap();
    }
    encoder.finish().unwrap();

    assert_eq!(decompress_file(&path, 1).unwrap(), payload);
}
