use bsp::{Dataset, LocalCluster, OutputLog, Partition, Peer, PeerId};
use regression::{
    Configuration, GradientDescentBsp, GradientDescentConfig, LeaderPolicy, ModelKind, Payload,
    RegressionModel, Role, TrainingErr, TrainingSummary,
    config::{ALPHA, INITIAL_THETA_VALUES, LEADER_PEER, LEADER_POLICY, REGRESSION_MODEL_CLASS, THRESHOLD},
};

type Outcome = Result<Vec<TrainingSummary>, TrainingErr>;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

async fn train_on(cluster: LocalCluster<Payload>, conf: Configuration) -> (Outcome, OutputLog) {
    init_logging();
    let output = cluster.output();

    let res = cluster
        .run(move |mut peer| {
            let conf = conf.clone();
            async move {
                let gd = GradientDescentBsp::setup(&conf, &peer)?;
                gd.run(&mut peer).await
            }
        })
        .await;

    (res, output)
}

async fn train(partitions: Vec<Partition>, conf: Configuration) -> (Outcome, OutputLog) {
    let cluster = LocalCluster::new(partitions).unwrap();
    train_on(cluster, conf).await
}

/// `copies` rows of x = [1], y = 1.
fn ones(copies: usize) -> Dataset {
    Dataset::new([1.0, 1.0].repeat(copies), 1).unwrap()
}

/// Rows `[1, x, 2x + 1]` for x in 0.0, 0.1, .., 0.9.
fn line() -> Dataset {
    let data = (0..10)
        .flat_map(|i| {
            let x = f64::from(i) / 10.0;
            [1.0, x, 2.0 * x + 1.0]
        })
        .collect();

    Dataset::new(data, 2).unwrap()
}

fn line_conf() -> Configuration {
    Configuration::new()
        .with(INITIAL_THETA_VALUES, 0)
        .with(ALPHA, 0.1)
        .with(THRESHOLD, 0.0001)
}

#[tokio::test(flavor = "multi_thread")]
async fn trivial_dataset_converges_below_threshold() {
    let conf = Configuration::new().with(ALPHA, 0.1).with(THRESHOLD, 0.01);
    let (res, output) = train(vec![ones(5).into_partition()], conf).await;

    let summary = res.unwrap().remove(0);
    assert!(summary.cost < 0.01);
    assert!(summary.iterations <= 20);
    assert_eq!(summary.role, Role::Leader);
    assert!((summary.theta[0] - 1.0).abs() < 0.2);

    let last = output.last().unwrap();
    assert_eq!(last.theta, summary.theta);
    assert_eq!(last.cost, summary.cost);
}

#[tokio::test(flavor = "multi_thread")]
async fn every_output_record_has_a_non_increasing_cost() {
    let conf = Configuration::new().with(ALPHA, 0.1).with(THRESHOLD, 0.01);
    let (res, output) = train(vec![ones(5).into_partition()], conf).await;
    let summary = res.unwrap().remove(0);

    let records = output.records();
    // One record per completed iteration plus the final one.
    assert_eq!(records.len() as u64, summary.iterations);

    for pair in records.windows(2) {
        assert!(pair[1].cost <= pair[0].cost);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn large_learning_rate_is_reported_as_divergence() {
    let conf = Configuration::new().with(ALPHA, 100).with(THRESHOLD, 0.01);
    let (res, output) = train(vec![ones(5).into_partition()], conf).await;

    match res {
        Err(TrainingErr::Diverged {
            alpha,
            iteration,
            cost,
            previous,
        }) => {
            assert_eq!(alpha, 100.0);
            assert_eq!(iteration, 2);
            assert!(cost > previous);
        }
        other => panic!("expected divergence, got {other:?}"),
    }

    // The record of the first iteration, then the final one with the last accepted cost.
    let records = output.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].cost, 40.5);
}

#[tokio::test(flavor = "multi_thread")]
async fn divergence_is_detected_on_every_peer_in_the_same_iteration() {
    let conf = Configuration::new().with(ALPHA, 100);
    let (res, _) = train(ones(9).partition(3), conf).await;

    assert!(matches!(res, Err(TrainingErr::Diverged { iteration: 2, .. })));
}

#[tokio::test(flavor = "multi_thread")]
async fn diverged_jobs_keep_the_leaders_final_record() {
    // Followers have nothing to write, so they are the first ones out.
    for _ in 0..50 {
        let conf = Configuration::new().with(ALPHA, 100);
        let (res, output) = train(ones(64).partition(8), conf).await;

        assert!(matches!(res, Err(TrainingErr::Diverged { iteration: 2, .. })));

        let records = output.records();
        assert_eq!(records.len(), 2);
        assert_eq!(output.writers(), vec![PeerId::new("peer-4")]);
        assert_eq!(records[1].cost, 40.5);
        assert_eq!(records[1].theta, records[0].theta);
    }
}

/// A linear hypothesis with a constant offset of 1.
struct Offset;

impl RegressionModel for Offset {
    fn cost(&self, x: &[f64], y: f64, theta: &[f64]) -> f64 {
        let diff = self.hypothesis(theta, x) - y;
        diff * diff / 2.0
    }

    fn hypothesis(&self, theta: &[f64], x: &[f64]) -> f64 {
        theta.iter().zip(x).map(|(t, x)| t * x).sum::<f64>() + 1.0
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn coordinator_accepts_a_custom_model() {
    init_logging();

    let cluster = LocalCluster::<Payload>::new(ones(8).partition(4)).unwrap();
    let output = cluster.output();
    let leader = PeerId::new("peer-3");

    let config = GradientDescentConfig::new()
        .with_initial_theta(0.5)
        .with_alpha(0.05)
        .with_threshold(1e-6)
        .with_model(ModelKind::Linear)
        .with_leader(LeaderPolicy::Fixed(leader.clone()));

    let summaries = cluster
        .run(move |mut peer| {
            let config = config.clone();
            let leader = leader.clone();
            async move {
                let gd =
                    GradientDescentBsp::with_config(config, &peer)?.with_model(Box::new(Offset));
                assert_eq!(gd.role().is_leader(), peer.id() == &leader);
                gd.run(&mut peer).await
            }
        })
        .await
        .unwrap();

    // y = 1 is fit by the offset alone.
    for summary in &summaries {
        assert!(summary.theta[0].abs() < 0.01, "{:?}", summary.theta);
    }
    assert_eq!(summaries[3].role, Role::Leader);
    assert_eq!(output.writers(), vec![PeerId::new("peer-3")]);
}

#[tokio::test(flavor = "multi_thread")]
async fn every_peer_ends_with_the_same_theta() {
    let (res, _) = train(line().partition(3), line_conf()).await;
    let summaries = res.unwrap();

    assert_eq!(summaries.len(), 3);
    for s in &summaries[1..] {
        assert_eq!(s.theta, summaries[0].theta);
        assert_eq!(s.cost, summaries[0].cost);
        assert_eq!(s.iterations, summaries[0].iterations);
    }

    let theta = &summaries[0].theta;
    assert_eq!(theta.len(), 2);
    assert!((theta[0] - 1.0).abs() < 0.1, "{theta:?}");
    assert!((theta[1] - 2.0).abs() < 0.2, "{theta:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn partitioning_does_not_change_the_result() {
    let (single, _) = train(vec![line().into_partition()], line_conf()).await;
    let single = single.unwrap().remove(0);

    for peers in [2, 4, 7] {
        let (res, _) = train(line().partition(peers), line_conf()).await;
        let multi = res.unwrap().remove(0);

        assert_eq!(multi.iterations, single.iterations, "{peers} peers");
        for (a, b) in multi.theta.iter().zip(&single.theta) {
            assert!((a - b).abs() < 1e-9, "{peers} peers: {a} vs {b}");
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn global_count_is_the_sum_of_partition_sizes() {
    let mut partitions = line().partition(3);
    // Followers may own nothing at all.
    partitions.push(Partition::empty(2));
    let sizes: usize = partitions.iter().map(Partition::len).sum();

    let (res, _) = train(partitions, line_conf()).await;

    for summary in res.unwrap() {
        assert_eq!(summary.examples, sizes as u64);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn only_the_middle_peer_writes() {
    for peers in 1..=5 {
        let (res, output) = train(line().partition(peers), line_conf()).await;
        let summaries = res.unwrap();

        let expected = PeerId::new(format!("peer-{}", peers / 2));
        assert_eq!(output.writers(), vec![expected], "{peers} peers");

        let leaders = summaries.iter().filter(|s| s.role == Role::Leader).count();
        assert_eq!(leaders, 1);
        assert_eq!(summaries[peers / 2].role, Role::Leader);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn leader_can_be_chosen_by_name() {
    let ids = vec![PeerId::new("c"), PeerId::new("a"), PeerId::new("b")];

    let cluster = LocalCluster::with_ids(ids.clone(), line().partition(3)).unwrap();
    let conf = line_conf().with(LEADER_POLICY, "smallest");
    let (res, output) = train_on(cluster, conf).await;
    res.unwrap();
    assert_eq!(output.writers(), vec![PeerId::new("a")]);

    let cluster = LocalCluster::with_ids(ids, line().partition(3)).unwrap();
    let conf = line_conf().with(LEADER_PEER, "c");
    let (res, output) = train_on(cluster, conf).await;
    res.unwrap();
    assert_eq!(output.writers(), vec![PeerId::new("c")]);
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_leader_fails_at_setup() {
    let conf = line_conf().with(LEADER_PEER, "nobody");
    let (res, output) = train(line().partition(2), conf).await;

    assert!(matches!(res, Err(TrainingErr::Config(_))));
    assert!(output.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_model_fails_at_setup() {
    let conf = line_conf().with(REGRESSION_MODEL_CLASS, "com.example.Svm");
    let (res, _) = train(line().partition(2), conf).await;

    assert!(matches!(res, Err(TrainingErr::Config(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_leader_partition_fails_the_bootstrap() {
    let mut partitions = line().partition(3);
    partitions[1] = Partition::empty(2);

    let (res, output) = train(partitions, line_conf()).await;

    assert!(matches!(res, Err(TrainingErr::DimensionProbe)));
    assert!(output.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn records_of_the_wrong_width_are_rejected() {
    let partitions = vec![line().into_partition(), ones(3).into_partition()];

    // peer-1 leads with a single feature, peer-0 holds two.
    let (res, _) = train(partitions, line_conf()).await;

    assert!(matches!(
        res,
        Err(TrainingErr::DimensionMismatch {
            what: "features",
            got: 2,
            expected: 1
        })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn logistic_model_separates_two_classes() {
    let data = vec![
        1.0, -2.0, 0.0, //
        1.0, -1.0, 0.0, //
        1.0, 1.0, 1.0, //
        1.0, 2.0, 1.0, //
    ];
    let ds = Dataset::new(data, 2).unwrap();

    let conf = Configuration::new()
        .with(REGRESSION_MODEL_CLASS, "logistic")
        .with(INITIAL_THETA_VALUES, 0)
        .with(ALPHA, 0.1);

    let (res, _) = train(ds.partition(2), conf).await;
    let summary = res.unwrap().remove(0);

    assert!(summary.cost < 0.1);
    assert!(summary.theta[1] > 0.0);
    assert!(summary.theta[0].abs() < 1e-6);
}
