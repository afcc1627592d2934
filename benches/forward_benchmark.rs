//! Forward-pass throughput of each architecture on a fixed batch

use acnets::config::{Architecture, ModelConfig};
use acnets::env::{ActionSpace, EnvironmentDescriptor};
use acnets::layers::Parameter;
use acnets::models::{build_model, ActorCritic};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::ArrayD;

const BATCH: usize = 32;

fn environment(architecture: Architecture) -> EnvironmentDescriptor {
    let env = match architecture {
        Architecture::MlpSharedContinuous | Architecture::MlpSeparateContinuous => {
            EnvironmentDescriptor::vector(17, ActionSpace::symmetric(6, 1.0))
        }
        Architecture::MlpDiscrete => EnvironmentDescriptor::vector(8, ActionSpace::discrete(4)),
        Architecture::ConvDiscrete => EnvironmentDescriptor::image(84, 84, 4, ActionSpace::discrete(6)),
        Architecture::ConvContinuous => EnvironmentDescriptor::image(64, 64, 3, ActionSpace::symmetric(3, 1.0)),
    };
    env.expect("benchmark environment is valid")
}

fn forward_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("forward");
    group.sample_size(20);

    for architecture in Architecture::ALL {
        let env = environment(architecture);
        let config = ModelConfig::builder()
            .architecture(architecture)
            .seed(0)
            .build()
            .expect("benchmark config is valid");
        let model = build_model(&config, &env).expect("benchmark model builds");

        let mut shape = vec![BATCH];
        shape.extend(&env.observation_shape);
        let observations = ArrayD::<f32>::from_elem(shape, 0.5);

        group.bench_with_input(BenchmarkId::from_parameter(architecture), &observations, |b, obs| {
            b.iter(|| model.forward(black_box(obs.view())).expect("forward succeeds"))
        });
    }

    group.finish();
}

fn policy_selection_benchmark(c: &mut Criterion) {
    let env = environment(Architecture::ConvDiscrete);
    let config = ModelConfig::builder().seed(0).build().expect("benchmark config is valid");
    let model = build_model(&config, &env).expect("benchmark model builds");

    c.bench_function("policy_parameters", |b| {
        b.iter(|| black_box(model.policy_parameters().map(|p| p.len()).sum::<usize>()))
    });
}

criterion_group!(benches, forward_benchmark, policy_selection_benchmark);
criterion_main!(benches);
