use criterion::{criterion_group, criterion_main, Criterion};
use job_match::{
    Apply, CorpusBuilder, Cv, CvSelectionPolicy, DatasetBuilder, EntityText, FeatureExtractor,
    InMemorySource, Job, NegativeSampling, Records, TermIndex, User,
};

const WORDS: &[&str] = &[
    "python", "rust", "golang", "java", "kotlin", "backend", "frontend", "data", "cloud",
    "kubernetes", "docker", "sql", "postgres", "react", "typescript", "ml", "pandas", "spark",
    "kafka", "linux", "security", "mobile", "swift", "devops", "testing", "api", "graphql",
];

/// deterministic pseudo-text, `n` words
fn text(seed: usize, n: usize) -> String {
    (0..n)
        .map(|i| WORDS[(seed * 31 + i * 7 + i * i) % WORDS.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

fn records(users: usize, jobs: usize) -> Records {
    Records {
        users: (0..users).map(|i| User { id: format!("u{i}"), name: None }).collect(),
        cvs: (0..users)
            .map(|i| Cv {
                id: format!("c{i}"),
                user_id: format!("u{i}"),
                skills: Some(text(i, 20)),
                experience: Some(text(i + 1000, 40)),
                created_at: None,
            })
            .collect(),
        jobs: (0..jobs)
            .map(|i| Job {
                id: format!("j{i}"),
                title: None,
                description: Some(text(i + 5000, 60)),
                requirement: Some(text(i + 9000, 20)),
            })
            .collect(),
        applies: (0..users).map(|i| Apply::new(format!("u{i}"), format!("j{}", i % jobs))).collect(),
    }
}

fn build_index(records: &Records) -> TermIndex {
    let mut corpus = CorpusBuilder::new();
    for cv in &records.cvs {
        corpus.push(EntityText::UserCv { user_id: &cv.user_id, cv });
    }
    for job in &records.jobs {
        corpus.push(EntityText::Job(job));
    }
    let mut index = TermIndex::new();
    index.build_index(&corpus.build()).expect("in-memory build");
    index
}

fn pipeline_benchmark(c: &mut Criterion) {
    let data = records(500, 200);

    c.bench_function("build_index", |b| b.iter(|| build_index(&data)));

    let index = build_index(&data);
    let vectorizer = index.vectorizer();
    let sample = text(42, 80);
    c.bench_function("vectorize", |b| b.iter(|| vectorizer.vectorize(&sample)));

    let extractor = FeatureExtractor::new(index.vectorizer(), CvSelectionPolicy::First);
    let source = InMemorySource::new(data.clone());
    c.bench_function("build_dataset", |b| {
        b.iter(|| {
            DatasetBuilder::new(&extractor, NegativeSampling::default())
                .build(&data.applies, &data.users, &data.jobs, &source)
                .expect("dataset")
        })
    });
}

criterion_group!(benches, pipeline_benchmark);
criterion_main!(benches);
