mod common;

use assert2::{check, let_assert};
use common::{FakeSource, SnapshotDir, sample_issues, snapshot_dir};
use rstest::rstest;
use tracker_dedup::{
    Corpus, DuplicateFinder, FoundIn, Issue, IssueCache, Language, MatchOptions, Query, ScanField,
    StemmingNormalizer, Threshold, calculate_similarity, find_similar_issues,
};

fn search(
    corpus: &Corpus,
    title: &str,
    description: &str,
    top_n: usize,
) -> Vec<tracker_dedup::Match> {
    find_similar_issues(
        &StemmingNormalizer::default(),
        &Query::new(title, description),
        corpus,
        MatchOptions { top_n },
    )
}

// --- Result invariants ---

#[rstest]
#[case("Login fails", "", 5)]
#[case("login", "user authentication", 2)]
#[case("button", "form", 1)]
#[case("user profile login", "user avatar authentication", 3)]
fn results_respect_ranking_invariants(
    sample_issues: Vec<Issue>,
    #[case] title: &str,
    #[case] description: &str,
    #[case] top_n: usize,
) {
    let corpus = Corpus::new(sample_issues);
    let matches = search(&corpus, title, description, top_n);

    check!(matches.len() <= top_n);
    check!(matches.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    for m in &matches {
        check!(m.similarity > 0.0);
        check!(m.similarity <= 1.0);
    }

    let mut keys: Vec<&str> = matches.iter().map(|m| m.key.as_str()).collect();
    keys.sort_unstable();
    keys.dedup();
    check!(keys.len() == matches.len());
}

#[test]
fn empty_corpus_returns_empty() {
    check!(search(&Corpus::default(), "Login fails", "anything", 5).is_empty());
}

#[rstest]
#[case("", "")]
#[case("the a of", "is it")]
#[case("?!", "--")]
fn query_without_tokens_returns_empty(
    sample_issues: Vec<Issue>,
    #[case] title: &str,
    #[case] description: &str,
) {
    let corpus = Corpus::new(sample_issues);
    check!(search(&corpus, title, description, 5).is_empty());
}

#[rstest]
fn repeated_queries_are_identical(sample_issues: Vec<Issue>) {
    let corpus = Corpus::new(sample_issues);
    let first = search(&corpus, "login user", "user cannot authenticate on profile", 5);
    let second = search(&corpus, "login user", "user cannot authenticate on profile", 5);
    check!(first == second);
}

// --- Reference behaviour ---

#[rstest]
fn login_query_ranks_login_issue_above_save_issue(sample_issues: Vec<Issue>) {
    let corpus = Corpus::new(sample_issues[..2].to_vec());
    let matches = search(&corpus, "Cannot log in", "User gets auth error", 5);

    let_assert!(Some(first) = matches.first());
    check!(first.key == "T-1");
    check!(first.found_in == FoundIn::Description);
    let t2_rank = matches.iter().position(|m| m.key == "T-2");
    check!(t2_rank.is_none_or(|rank| rank > 0));
}

#[rstest]
fn identical_title_scores_one_and_ranks_first(sample_issues: Vec<Issue>) {
    let corpus = Corpus::new(sample_issues);
    let matches = search(&corpus, "Save button broken", "", 5);

    let_assert!(Some(first) = matches.first());
    check!(first.key == "T-2");
    check!(first.found_in == FoundIn::Title);
    check!((first.similarity - 1.0).abs() < 1e-9);
}

#[rstest]
fn description_match_can_outrank_title_match(sample_issues: Vec<Issue>) {
    let corpus = Corpus::new(sample_issues);
    let matches = search(
        &corpus,
        "Avatar",
        "User avatar image does not load on the profile page",
        5,
    );

    let_assert!(Some(first) = matches.first());
    check!(first.key == "T-3");
    check!(first.found_in == FoundIn::Description);
}

#[test]
fn title_terms_do_not_score_against_descriptions() {
    let corpus = Corpus::new(vec![
        Issue::new("T-1", "Alpha", "kubernetes ingress certificate"),
        Issue::new("T-2", "Beta", "Dashboard loads slowly"),
    ]);
    check!(search(&corpus, "kubernetes ingress", "", 5).is_empty());

    let matches = search(&corpus, "Beta", "kubernetes ingress", 5);
    let keys: Vec<_> = matches.iter().map(|m| (m.key.as_str(), m.found_in)).collect();
    check!(keys == [("T-2", FoundIn::Title), ("T-1", FoundIn::Description)]);
}

#[test]
fn russian_corpus_matches_inflected_forms() {
    let corpus = Corpus::new(vec![
        Issue::new(
            "TEST-1",
            "Ошибка при авторизации пользователя",
            "Пользователь не может войти в систему.",
        ),
        Issue::new(
            "TEST-2",
            "Не работает кнопка \"Сохранить\"",
            "Кнопка неактивна после заполнения формы.",
        ),
        Issue::new(
            "TEST-3",
            "Проблема с отображением профиля",
            "Аватар пользователя не загружается.",
        ),
    ]);
    let normalizer = StemmingNormalizer::new(Language::Russian);
    let matches = find_similar_issues(
        &normalizer,
        &Query::new("Ошибки авторизации", ""),
        &corpus,
        MatchOptions::default(),
    );

    let_assert!(Some(first) = matches.first());
    check!(first.key == "TEST-1");
    check!(first.found_in == FoundIn::Title);
}

// --- Duplicate audit ---

#[test]
fn audit_reports_only_the_near_duplicate_pair() {
    let corpus = Corpus::new(vec![
        Issue::new("A", "Nightly backup job fails on storage cluster", ""),
        Issue::new("B", "Nightly backup job fails on storage cluster again", ""),
        Issue::new("C", "Dark mode colors wrong in settings", ""),
    ]);
    let pairs = calculate_similarity(
        &StemmingNormalizer::default(),
        &corpus,
        ScanField::Title,
        Threshold::default(),
    );

    let_assert!([pair] = pairs.as_slice());
    check!((pair.first.as_str(), pair.second.as_str()) == ("A", "B"));
}

// --- Finder over the cache ---

#[rstest]
#[tokio::test]
async fn finder_distinguishes_no_matches_from_failure(
    snapshot_dir: SnapshotDir,
    sample_issues: Vec<Issue>,
) {
    let source = FakeSource::returning(sample_issues);
    let cache = IssueCache::open(&source, snapshot_dir.settings()).await;
    let finder =
        DuplicateFinder::new(cache, StemmingNormalizer::default(), MatchOptions::default());

    let_assert!(Ok(lookup) = finder.find(&Query::new("Kubernetes ingress", "certificate")).await);
    check!(lookup.matches.is_empty());
    check!(lookup.corpus.len() == 5);

    let failing = IssueCache::open(
        FakeSource::failing(),
        snapshot_dir.settings_with_ttl(std::time::Duration::ZERO),
    )
    .await;
    let finder =
        DuplicateFinder::new(failing, StemmingNormalizer::default(), MatchOptions::default());
    check!(finder.find(&Query::new("Login fails", "")).await.is_err());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn finder_audit_runs_over_cached_corpus(snapshot_dir: SnapshotDir) {
    let source = FakeSource::returning(vec![
        Issue::new("A", "Disk full on build agent", ""),
        Issue::new("B", "Disk full on build agent", ""),
        Issue::new("C", "Typo on pricing page", ""),
    ]);
    let cache = IssueCache::open(&source, snapshot_dir.settings()).await;
    let finder =
        DuplicateFinder::new(cache, StemmingNormalizer::default(), MatchOptions::default());

    let_assert!(Ok(pairs) = finder.audit(ScanField::Title, Threshold::default()).await);
    check!(pairs.len() == 1);
    check!(source.fetches() == 1);
    check!(finder.cache().snapshot_size().await == 3);
}
