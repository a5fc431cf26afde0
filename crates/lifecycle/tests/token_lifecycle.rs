use kb_lifecycle::{
    compute_status, decode_resource_token, derive_salt, encode_resource_token,
    normalize_resource_path, LifecycleError, LifecycleStatus,
};

const CREATED: i64 = 1_700_000_000_000;

#[test]
fn normalize_is_idempotent_over_a_messy_corpus() {
    let corpus = [
        "./fixtures/Doc/Report.DOCX",
        "fixtures\\ppt\\Slides.PPTX",
        "a//b///c.TXT",
        " spaced/Name.Md ",
        "plain/no_extension",
        ".hidden",
        "deep/Tree/Of/Dirs/File.JSON",
    ];
    for raw in corpus {
        let once = normalize_resource_path(raw).unwrap();
        let twice = normalize_resource_path(&once).unwrap();
        assert_eq!(once, twice, "normalize not idempotent for {raw:?}");
    }
}

#[test]
fn encode_decode_roundtrip_matches_the_salt_deriver() {
    for (kb_id, path, created, seed) in [
        ("kb-a", "./docs/Guide.MD", CREATED, 0_i64),
        ("kb-b", "x\\y\\Z.PdF", CREATED + 12_345, 42),
        ("3b2f4d8e", "one.file", 0, -7),
    ] {
        let token = encode_resource_token(kb_id, path, created, seed).unwrap();
        let payload = decode_resource_token(&token).unwrap();

        let rp = normalize_resource_path(path).unwrap();
        assert_eq!(payload.kb_id, kb_id);
        assert_eq!(payload.rp, rp);
        assert_eq!(payload.ca_ms, created);
        assert_eq!(payload.salt, derive_salt(seed, kb_id, &rp));
    }
}

#[test]
fn terminal_outcome_is_reproducible_from_the_token_alone() {
    let token = encode_resource_token("kb-a", "docs/report.pdf", CREATED, 11).unwrap();
    let payload = decode_resource_token(&token).unwrap();

    let first = compute_status(payload.ca_ms, payload.ca_ms + 1_200, payload.salt, 0.3).unwrap();
    assert!(first.is_terminal());

    // Decoding again and re-querying much later never changes the answer.
    let payload2 = decode_resource_token(&token).unwrap();
    let later = compute_status(
        payload2.ca_ms,
        payload2.ca_ms + 3_600_000,
        payload2.salt,
        0.3,
    )
    .unwrap();
    assert_eq!(first, later);
}

#[test]
fn failure_rate_extremes_force_the_terminal_state() {
    for path in ["a.txt", "b.md", "c/d.json", "e/F.PNG"] {
        let token = encode_resource_token("kb", path, CREATED, 5).unwrap();
        let p = decode_resource_token(&token).unwrap();
        assert_eq!(
            compute_status(p.ca_ms, p.ca_ms + 10_000, p.salt, 0.0).unwrap(),
            LifecycleStatus::Indexed
        );
        assert_eq!(
            compute_status(p.ca_ms, p.ca_ms + 10_000, p.salt, 1.0).unwrap(),
            LifecycleStatus::Error
        );
    }
}

#[test]
fn corrupted_tokens_fail_closed() {
    let token = encode_resource_token("kb", "docs/a.txt", CREATED, 0).unwrap();

    // Truncations at every length must resolve to MalformedToken, never panic.
    for cut in 0..token.len() {
        match decode_resource_token(&token[..cut]) {
            Ok(p) => panic!("truncation at {cut} unexpectedly decoded: {p:?}"),
            Err(LifecycleError::MalformedToken(_)) => {}
            Err(other) => panic!("truncation at {cut} gave unexpected error: {other}"),
        }
    }
}
