use machine_learning::{
    batches::BatchGenerator,
    dataset::{Dataset, SyntheticImages},
    metrics::Accuracy,
    model::LinearClassifier,
    ops,
};
use rand::{SeedableRng, rngs::StdRng};

#[test]
fn linear_classifier_learns_synthetic_images() {
    let source = SyntheticImages::new(&[4, 4, 3], 2, 12., &mut StdRng::seed_from_u64(42)).unwrap();
    let train = source.generate(100, &mut StdRng::seed_from_u64(1)).unwrap();
    let validation = source.generate(40, &mut StdRng::seed_from_u64(2)).unwrap();

    let op = ops::normalize_u8_images();
    let num_classes = train.num_classes();
    let train = BatchGenerator::new(train, 10, true, op.clone())
        .unwrap()
        .with_seed(3);
    let validation = BatchGenerator::new(validation, 10, false, op).unwrap();

    let mut clf = LinearClassifier::new(48, num_classes, 0.01, 0.9, false).unwrap();

    for _ in 0..10 {
        for batch in &train {
            let batch = batch.unwrap();
            clf.train(batch.data.view(), batch.labels.view()).unwrap();
        }
    }

    let mut accuracy = Accuracy::new();
    for batch in &validation {
        let batch = batch.unwrap();
        let predicted = clf.predict(batch.data.view()).unwrap();
        accuracy.update(predicted.view(), batch.labels.view()).unwrap();
    }

    assert_eq!(accuracy.total(), 40);
    assert_eq!(accuracy.accuracy(), 1.);
}

#[test]
fn every_pass_covers_the_dataset() {
    let source = SyntheticImages::new(&[2, 2, 1], 3, 4., &mut StdRng::seed_from_u64(0)).unwrap();
    let dataset = source.generate(23, &mut StdRng::seed_from_u64(0)).unwrap();
    let generator = BatchGenerator::new(dataset, 5, true, ops::normalize_u8_images())
        .unwrap()
        .with_seed(11);

    for _ in 0..3 {
        let pass = generator.iter();
        let mut order = pass.order().to_vec();

        let rows: usize = pass.map(|batch| batch.unwrap().len()).sum();
        assert_eq!(rows, 23);

        order.sort_unstable();
        assert_eq!(order, (0..23).collect::<Vec<_>>());
    }
}
