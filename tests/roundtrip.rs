
//! End-to-end scenarios: compress, wrap in an entity, decompress,
//! compare against the (rounded) input.

use plato_cmp::prelude::*;
use plato_cmp::compress::model::{round_fwd, round_inv};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};


fn imagette_bytes(samples: &[u16]) -> Vec<u8> {
    samples.iter().flat_map(|sample| sample.to_be_bytes()).collect()
}

fn output_for(data_type: DataType, buffer_length: u32) -> Vec<u8> {
    vec![0u8; data_type.data_size(buffer_length).expect("sane test sizes") as usize]
}

/// Compress with an imagette configuration, returning (bits, output).
fn compress_imagette_stream(
    mode: CmpMode, model_value: u32, round: u32,
    golomb_par: u32, spill: u32,
    input: &[u8], samples: u32,
    model: ModelBuffers<'_>, buffer_length: u32,
) -> Result<(u32, Vec<u8>)>
{
    let mut output = output_for(DataType::Imagette, buffer_length);

    let mut cfg = CmpCfg::new(DataType::Imagette, mode, model_value, round)?;
    cfg.imagette(golomb_par, spill, CMP_PAR_UNUSED, CMP_PAR_UNUSED, CMP_PAR_UNUSED, CMP_PAR_UNUSED)?;
    cfg.buffers(input, samples, model, Some(&mut output), buffer_length)?;

    let bits = compress(&mut cfg)?;
    Ok((bits, output))
}


#[test]
fn raw_imagette_payload_is_the_big_endian_input(){
    let input = imagette_bytes(&[23, 42, 42, 420, 23, 42]);
    let mut output = output_for(DataType::Imagette, 6);

    let mut cfg = CmpCfg::new(DataType::Imagette, CmpMode::Raw, 0, 0).unwrap();
    cfg.buffers(&input, 6, ModelBuffers::None, Some(&mut output), 6).unwrap();

    let bits = compress(&mut cfg).expect("compresses");
    assert_eq!(bits, 96);

    // and back out through an entity
    let mut entity = CmpEntity::build(1, 0, 0, 0, 0, &cfg, bits).expect("builds");

    assert_eq!(output, [
        0x00, 0x17, 0x00, 0x2a, 0x00, 0x2a,
        0x01, 0xa4, 0x00, 0x17, 0x00, 0x2a,
    ]);
    entity.set_data(&output).expect("fits");

    let decompressed = decompress(&entity, ModelBuffers::None).expect("decompresses");
    assert_eq!(decompressed, input);
}

#[test]
fn raw_mode_rejects_a_short_buffer(){
    let input = imagette_bytes(&[23, 42, 42, 420, 23, 42]);
    let mut output = output_for(DataType::Imagette, 5);

    let mut cfg = CmpCfg::new(DataType::Imagette, CmpMode::Raw, 0, 0).unwrap();
    cfg.buffers(&input, 6, ModelBuffers::None, Some(&mut output), 5).unwrap();

    assert_eq!(compress(&mut cfg), Err(Error::SmallBuffer));
}

#[test]
fn diff_zero_escape_stream_is_bit_exact(){
    let input = imagette_bytes(&[4, 8, 12, 16, 20, 24, 28, 32]);

    // every residual maps to 8, escaping through code word zero:
    // 17 bits per sample, 136 bits total
    let (bits, output) = compress_imagette_stream(
        CmpMode::DiffZero, 0, 0, 1, 8, &input, 8, ModelBuffers::None, 10,
    ).expect("compresses");

    assert_eq!(bits, 8 * 17);
    assert_eq!(&output[0..4], &[0x00, 0x04, 0x80, 0x02]);

    // a buffer of exactly the stream size still fails: capacity is
    // counted in whole 32-bit words, and 9 samples round down to 16 bytes
    let result = compress_imagette_stream(
        CmpMode::DiffZero, 0, 0, 1, 8, &input, 8, ModelBuffers::None, 9,
    );
    assert_eq!(result.unwrap_err(), Error::SmallBuffer);

    // decompression reproduces the input exactly
    let mut cfg = CmpCfg::new(DataType::Imagette, CmpMode::DiffZero, 0, 0).unwrap();
    cfg.imagette(1, 8, CMP_PAR_UNUSED, CMP_PAR_UNUSED, CMP_PAR_UNUSED, CMP_PAR_UNUSED).unwrap();
    cfg.buffers(&input, 8, ModelBuffers::None, None, 10).unwrap();

    let mut entity = CmpEntity::build(1, 0, 0, 0, 0, &cfg, bits).expect("builds");
    entity.set_data(&output[.. entity.data_size() as usize]).expect("fits");

    let decompressed = decompress(&entity, ModelBuffers::None).expect("decompresses");
    assert_eq!(decompressed, input);
}

#[test]
fn lossy_model_compression_round_trips_to_rounded_values(){
    let round = 2;
    let input: Vec<u16> = vec![60, 32, 65, 33, 66, 35, 1000, 0, 44];
    let model: Vec<u16> = vec![58, 33, 63, 33, 64, 30, 900, 10, 40];

    let input_bytes = imagette_bytes(&input);
    let model_bytes = imagette_bytes(&model);

    let mut updated_compress = vec![0u8; input_bytes.len()];
    let spill = 1623; // the highest valid threshold for parameter 63

    let mut output = output_for(DataType::Imagette, 9);
    let mut cfg = CmpCfg::new(DataType::Imagette, CmpMode::ModelMulti, 11, round).unwrap();
    cfg.imagette(63, spill, CMP_PAR_UNUSED, CMP_PAR_UNUSED, CMP_PAR_UNUSED, CMP_PAR_UNUSED).unwrap();
    cfg.buffers(
        &input_bytes, 9,
        ModelBuffers::Separate { model: &model_bytes, updated: Some(&mut updated_compress) },
        Some(&mut output), 9,
    ).unwrap();

    let bits = compress(&mut cfg).expect("compresses");

    let mut entity = CmpEntity::build(7, 100, 200, 3, 1, &cfg, bits).expect("builds");
    entity.set_data(&output[.. entity.data_size() as usize]).expect("fits");

    // decompression returns the rounded input and reproduces the
    // compressor's updated model
    let mut updated_decompress = vec![0u8; input_bytes.len()];
    let decompressed = decompress(
        &entity,
        ModelBuffers::Separate { model: &model_bytes, updated: Some(&mut updated_decompress) },
    ).expect("decompresses");

    let rounded: Vec<u16> = input.iter()
        .map(|&value| round_inv(round_fwd(u32::from(value), round), round) as u16)
        .collect();

    assert_eq!(decompressed, imagette_bytes(&rounded));
    assert_eq!(updated_decompress, updated_compress);
}

#[test]
fn round_trip_over_sample_counts_and_rounding(){
    for &samples in &[0u32, 1, 5] {
        for round in 0 ..= 3 {
            let values: Vec<u16> = (0 .. samples as u16).map(|i| i * 39 + 7).collect();
            let input = imagette_bytes(&values);

            let (bits, output) = compress_imagette_stream(
                CmpMode::DiffMulti, 0, round, 4, 48,
                &input, samples, ModelBuffers::None, samples + 2,
            ).expect("compresses");

            if samples == 0 {
                assert_eq!(bits, 0);
                continue;
            }

            let mut cfg = CmpCfg::new(DataType::Imagette, CmpMode::DiffMulti, 0, round).unwrap();
            cfg.imagette(4, 48, CMP_PAR_UNUSED, CMP_PAR_UNUSED, CMP_PAR_UNUSED, CMP_PAR_UNUSED).unwrap();
            cfg.buffers(&input, samples, ModelBuffers::None, None, samples + 2).unwrap();

            let mut entity = CmpEntity::build(1, 0, 0, 0, 0, &cfg, bits).expect("builds");
            entity.set_data(&output[.. entity.data_size() as usize]).expect("fits");

            let decompressed = decompress(&entity, ModelBuffers::None).expect("decompresses");

            let rounded: Vec<u16> = values.iter()
                .map(|&value| round_inv(round_fwd(u32::from(value), round), round) as u16)
                .collect();

            assert_eq!(decompressed, imagette_bytes(&rounded),
                "samples {} round {}", samples, round);
        }
    }
}

#[test]
fn random_imagettes_round_trip_in_all_modes(){
    let mut random = StdRng::seed_from_u64(0x5eed);

    for mode in [CmpMode::DiffZero, CmpMode::DiffMulti, CmpMode::ModelZero, CmpMode::ModelMulti] {
        for _ in 0 .. 20 {
            let samples = random.gen_range(1 ..= 64u32);
            let values: Vec<u16> = (0 .. samples).map(|_| random.gen()).collect();
            let model_values: Vec<u16> = (0 .. samples).map(|_| random.gen()).collect();

            let input = imagette_bytes(&values);
            let model_bytes = imagette_bytes(&model_values);
            let golomb_par = random.gen_range(1 ..= 63);
            let spill = random.gen_range(2 ..= plato_cmp::cfg::ima_max_spill(golomb_par));

            // worst case is an escape on every sample, always fits
            let buffer_length = samples * 4 + 4;

            let model_value = random.gen_range(0 ..= 16);
            let model = || {
                if mode.is_model() { ModelBuffers::Separate { model: &model_bytes, updated: None } }
                else { ModelBuffers::None }
            };

            let (bits, output) = compress_imagette_stream(
                mode, model_value, 0, golomb_par, spill,
                &input, samples, model(), buffer_length,
            ).expect("compresses");

            let mut cfg = CmpCfg::new(DataType::Imagette, mode, model_value, 0).unwrap();
            cfg.imagette(golomb_par, spill, CMP_PAR_UNUSED, CMP_PAR_UNUSED, CMP_PAR_UNUSED, CMP_PAR_UNUSED).unwrap();
            cfg.buffers(&input, samples, model(), None, buffer_length).unwrap();

            let mut entity = CmpEntity::build(1, 0, 0, 0, 0, &cfg, bits).expect("builds");
            entity.set_data(&output[.. entity.data_size() as usize]).expect("fits");

            let decompressed = decompress(&entity, model()).expect("decompresses");
            assert_eq!(decompressed, input,
                "mode {:?} golomb {} spill {} samples {}", mode, golomb_par, spill, samples);
        }
    }
}

#[test]
fn flux_records_round_trip(){
    // s_fx_ncob: multi-entry header, then (exp_flags u8, fx, ncob_x, ncob_y)
    let records: [(u8, u32, u32, u32); 3] = [
        (1, 0x001f_0000, 500, 600),
        (1, 0x001f_4021, 505, 598),
        (3, 0x001e_ff00, 510, 601),
    ];

    let mut input = vec![0x5a; 12];
    for (exp_flags, fx, ncob_x, ncob_y) in records {
        input.push(exp_flags);
        input.extend_from_slice(&fx.to_be_bytes());
        input.extend_from_slice(&ncob_x.to_be_bytes());
        input.extend_from_slice(&ncob_y.to_be_bytes());
    }

    let mut output = output_for(DataType::SFxNcob, 3);
    let mut cfg = CmpCfg::new(DataType::SFxNcob, CmpMode::DiffZero, 0, 0).unwrap();
    cfg.fx_cob(
        2, 8, 4, 16, 5, 20,
        CMP_PAR_UNUSED, CMP_PAR_UNUSED, CMP_PAR_UNUSED, CMP_PAR_UNUSED,
        CMP_PAR_UNUSED, CMP_PAR_UNUSED,
    ).unwrap();
    cfg.buffers(&input, 3, ModelBuffers::None, Some(&mut output), 3).unwrap();

    let bits = compress(&mut cfg).expect("compresses");
    assert!(bits > 96);

    let mut entity = CmpEntity::build(1, 0, 0, 0, 0, &cfg, bits).expect("builds");

    // the multi-entry header is passed through untouched
    assert_eq!(&output[..12], &[0x5a; 12]);
    entity.set_data(&output[.. entity.data_size() as usize]).expect("fits");

    let decompressed = decompress(&entity, ModelBuffers::None).expect("decompresses");
    assert_eq!(decompressed, input);
}

#[test]
fn long_cadence_records_round_trip_with_model(){
    // l_fx_ncob: 7 fields per record, variances share one parameter pair
    let mut random = StdRng::seed_from_u64(42);

    let samples = 10usize;
    let mut input = vec![0x10; 12];
    let mut model_bytes = vec![0x10; 12];
    for _ in 0 .. samples {
        for _ in 0 .. 7 {
            input.extend_from_slice(&random.gen_range(0u32 .. 1 << 20).to_be_bytes());
            model_bytes.extend_from_slice(&random.gen_range(0u32 .. 1 << 20).to_be_bytes());
        }
    }

    let mut updated_compress = vec![0u8; input.len()];
    let mut output = output_for(DataType::LFxNcob, samples as u32 + 4);

    let mut cfg = CmpCfg::new(DataType::LFxNcob, CmpMode::ModelMulti, 8, 0).unwrap();
    cfg.fx_cob(2, 8, 4, 16, 5, 20, CMP_PAR_UNUSED, CMP_PAR_UNUSED,
               CMP_PAR_UNUSED, CMP_PAR_UNUSED, 6, 24).unwrap();
    cfg.buffers(
        &input, samples as u32,
        ModelBuffers::Separate { model: &model_bytes, updated: Some(&mut updated_compress) },
        Some(&mut output), samples as u32 + 4,
    ).unwrap();

    let bits = compress(&mut cfg).expect("compresses");

    let mut entity = CmpEntity::build(1, 0, 0, 0, 0, &cfg, bits).expect("builds");
    entity.set_data(&output[.. entity.data_size() as usize]).expect("fits");

    let mut updated_decompress = vec![0u8; input.len()];
    let decompressed = decompress(
        &entity,
        ModelBuffers::Separate { model: &model_bytes, updated: Some(&mut updated_decompress) },
    ).expect("decompresses");

    assert_eq!(decompressed, input);
    assert_eq!(updated_decompress, updated_compress);
}

#[test]
fn auxiliary_records_round_trip(){
    let mut input = vec![0u8; 12];
    for record in [[100u32, 20, 3], [104, 22, 3], [99, 25, 2]] {
        for value in record {
            input.extend_from_slice(&value.to_be_bytes());
        }
    }

    let mut output = output_for(DataType::Smearing, 3);
    let mut cfg = CmpCfg::new(DataType::Smearing, CmpMode::DiffZero, 0, 0).unwrap();
    cfg.aux(2, 8, 3, 12, 4, 16).unwrap();
    cfg.buffers(&input, 3, ModelBuffers::None, Some(&mut output), 3).unwrap();

    let bits = compress(&mut cfg).expect("compresses");

    let mut entity = CmpEntity::build(1, 0, 0, 0, 0, &cfg, bits).expect("builds");
    entity.set_data(&output[.. entity.data_size() as usize]).expect("fits");

    let decompressed = decompress(&entity, ModelBuffers::None).expect("decompresses");
    assert_eq!(decompressed, input);
}

#[test]
fn oversized_values_fail_with_high_value(){
    // the flight table allows 2 bits for short-cadence exposure flags
    let mut input = vec![0u8; 12];
    input.push(0x0f); // needs 4 bits
    input.extend_from_slice(&100u32.to_be_bytes());

    let mut output = output_for(DataType::SFx, 2);
    let mut cfg = CmpCfg::new(DataType::SFx, CmpMode::DiffZero, 0, 0).unwrap()
        .with_max_used_bits(&MAX_USED_BITS_V1).unwrap();
    cfg.fx_cob(2, 8, 4, 16, CMP_PAR_UNUSED, CMP_PAR_UNUSED,
               CMP_PAR_UNUSED, CMP_PAR_UNUSED, CMP_PAR_UNUSED, CMP_PAR_UNUSED,
               CMP_PAR_UNUSED, CMP_PAR_UNUSED).unwrap();
    cfg.buffers(&input, 1, ModelBuffers::None, Some(&mut output), 2).unwrap();

    assert_eq!(compress(&mut cfg), Err(Error::HighValue));
}

#[test]
fn invalid_configurations_leave_the_output_untouched(){
    let input = imagette_bytes(&[1, 2, 3]);
    let mut output = vec![0xaa; 8];

    let mut cfg = CmpCfg::new(DataType::Imagette, CmpMode::DiffZero, 0, 0).unwrap();
    // spill of 1 is below the minimum
    let _ = cfg.imagette(4, 1, CMP_PAR_UNUSED, CMP_PAR_UNUSED, CMP_PAR_UNUSED, CMP_PAR_UNUSED);
    cfg.buffers(&input, 3, ModelBuffers::None, Some(&mut output), 4).unwrap();

    match compress(&mut cfg) {
        Err(Error::InvalidConfig(flags)) => assert!(flags.contains(ErrorFlags::CMP_PAR)),
        other => panic!("expected an invalid-config error, got {:?}", other),
    }

    assert_eq!(output, vec![0xaa; 8]);
}

#[test]
fn adaptive_estimates_cover_all_three_parameter_pairs(){
    let values: Vec<u16> = (0 .. 32).map(|i| 1000 + (i % 7) * 3).collect();
    let input = imagette_bytes(&values);

    let mut cfg = CmpCfg::new(DataType::ImagetteAdaptive, CmpMode::DiffZero, 0, 0).unwrap();
    cfg.imagette_default().unwrap();
    cfg.buffers(&input, 32, ModelBuffers::None, None, 40).unwrap();

    let [primary, ap1, ap2] = adaptive_size_estimates(&mut cfg).expect("estimates");
    assert!(primary > 0 && ap1 > 0 && ap2 > 0);

    // the primary pair still drives the real compression afterwards
    assert_eq!(compress(&mut cfg).expect("compresses"), primary);
}
