use candle_core::Device;
use toxicnn_core::embedding::{EmbeddingIndex, EmbeddingMatrix};
use toxicnn_core::model::{ModelConfig, ToxicityCnn};
use toxicnn_core::predict::Predictor;
use toxicnn_core::text::{CommentTokenizer, SequenceEncoder, Vocabulary};
use toxicnn_core::train::{EarlyStopping, StopReason, TrainConfig, Trainer};
use toxicnn_core::types::{Comment, LabelSet, NUM_LABELS};
use toxicnn_core::{PipelineConfig, prepare};

const DIM: usize = 8;

fn small_model() -> ModelConfig {
    ModelConfig::new()
        .with_embed_dim(DIM)
        .with_num_filters(4)
        .with_hidden_units(6)
}

fn toy_vectors(tokens: &[&str]) -> EmbeddingIndex {
    tokens
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let v: Vec<f32> = (0..DIM).map(|d| ((i + d) % 5) as f32 * 0.2 - 0.4).collect();
            ((*t).to_string(), v)
        })
        .collect()
}

#[test]
fn cats_scenario_trains_and_predicts() {
    let train = vec![
        Comment::labeled("0", "I love cats", LabelSet::clean()),
        Comment::labeled("1", "I hate cats", LabelSet::clean()),
    ];
    let config = PipelineConfig::new()
        .with_model(small_model())
        .with_train(
            TrainConfig::new()
                .with_batch_size(2)
                .with_epochs(2)
                .with_validation_split(0.0),
        );

    let prepared = prepare(&train, &[], &config).unwrap();
    let vocab = prepared.pipeline.vocabulary();
    assert_eq!(vocab.len(), 3);
    for token in ["love", "hate", "cats"] {
        assert!(vocab.id(token).is_some(), "{token} missing");
    }
    assert_eq!(vocab.id("i"), None);
    // both texts have 3 raw pieces: mean 3, std 0
    assert_eq!(prepared.pipeline.max_seq_len(), 3);

    let index = toy_vectors(&["cats", "love"]);
    let (matrix, report) = EmbeddingMatrix::align(vocab, &index, DIM).unwrap();
    assert_eq!(report.not_found, vec!["hate".to_string()]);
    let hate = vocab.id("hate").unwrap() as usize;
    assert!(matrix.is_zero_row(hate));
    assert!(matrix.is_zero_row(0));

    let mut model = ToxicityCnn::new(small_model(), 3, &matrix, 0, &Device::Cpu).unwrap();
    let trainer = Trainer::new(config.train.clone()).unwrap();
    let outcome = trainer
        .fit(&mut model, &prepared.train, &prepared.train_labels)
        .unwrap();
    assert_eq!(outcome.history.stop_reason, StopReason::EpochCap);

    let unseen = prepared.pipeline.encode_texts(&["cats are great"]);
    let preds = Predictor::new(&model, 16).predict(&unseen).unwrap();
    let row = preds.row(0).unwrap();
    assert_eq!(row.len(), NUM_LABELS);
    assert!(row.iter().all(|p| (0.0..=1.0).contains(p)));
}

#[test]
fn probabilities_are_not_normalized_across_labels() {
    let tokens = ["alpha", "beta", "gamma", "delta"];
    let vocab = Vocabulary::fit(&[tokens.to_vec()], 100);
    let (matrix, _) = EmbeddingMatrix::align(&vocab, &toy_vectors(&tokens), DIM).unwrap();
    let model = ToxicityCnn::new(small_model(), 4, &matrix, 9, &Device::Cpu).unwrap();

    let seqs = SequenceEncoder::new(4).encode_all(&vocab, &[tokens.to_vec()]);
    let preds = Predictor::new(&model, 1).predict(&seqs).unwrap();
    let sum: f32 = preds.row(0).unwrap().iter().sum();
    // six independent sigmoids near 0.5 at initialisation
    assert!((sum - 1.0).abs() > 0.1, "sum {sum}");
}

#[test]
fn encode_decode_round_trip_drops_only_unknown_tokens() {
    let tokenizer = CommentTokenizer::new().unwrap();
    let docs = tokenizer.tokenize_all(&["red green blue", "green blue", "blue"]);
    // cap 3 keeps ids 1..=2: blue, green
    let vocab = Vocabulary::fit(&docs, 3);

    let tokens = tokenizer.tokenize("blue red green purple green");
    let encoded = SequenceEncoder::new(8).encode(&vocab, &tokens);
    assert_eq!(encoded[..5], [0, 0, 0, 0, 0]);
    assert_eq!(vocab.decode(&encoded), vec!["blue", "green", "green"]);
}

#[test]
fn plateauing_validation_loss_stops_at_epoch_six() {
    let history = [0.5, 0.49, 0.489, 0.489, 0.489, 0.489, 0.489, 0.489];
    let mut stopper = EarlyStopping::new(4, 0.01);
    let stopped = history.iter().position(|&l| stopper.update(l)).map(|i| i + 1);
    assert_eq!(stopped, Some(6));
}

#[test]
fn saved_model_predicts_identically() {
    let tokens = ["one", "two", "three"];
    let vocab = Vocabulary::fit(&[tokens.to_vec()], 100);
    let (matrix, _) = EmbeddingMatrix::align(&vocab, &toy_vectors(&tokens), DIM).unwrap();
    let model = ToxicityCnn::new(small_model(), 4, &matrix, 2, &Device::Cpu).unwrap();

    let dir = std::env::temp_dir().join(format!("toxicnn-e2e-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("model.safetensors");
    model.save(&path).unwrap();
    let loaded = ToxicityCnn::load(&path, small_model(), 4, &Device::Cpu).unwrap();
    std::fs::remove_dir_all(&dir).unwrap();

    let seqs = SequenceEncoder::new(4).encode_all(&vocab, &[tokens.to_vec()]);
    let a = Predictor::new(&model, 4).predict(&seqs).unwrap();
    let b = Predictor::new(&loaded, 4).predict(&seqs).unwrap();
    assert_eq!(a, b);
}
