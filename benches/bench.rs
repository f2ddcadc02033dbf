use criterion::{black_box, criterion_group, criterion_main, Criterion};

use urltree::{parse_url, recognize, Route};

fn github_config() -> Vec<Route> {
    vec![
        Route::new("authorizations").children(vec![Route::new(""), Route::new(":id")]),
        Route::new("applications/:client/tokens/:token"),
        Route::new("events"),
        Route::new("repos/:owner/:repo").children(vec![
            Route::new("events"),
            Route::new("issues").children(vec![
                Route::new(""),
                Route::new(":number").children(vec![
                    Route::new("comments"),
                    Route::new("events"),
                    Route::new("labels"),
                ]),
            ]),
            Route::new("branches").children(vec![Route::new(""), Route::new(":branch")]),
            Route::new("commits/:sha").children(vec![Route::new(""), Route::new("comments")]),
            Route::new("git").children(vec![
                Route::new("blobs/:sha"),
                Route::new("commits/:sha"),
                Route::new("refs"),
                Route::new("tags/:sha"),
                Route::new("trees/:sha"),
            ]),
            Route::new("stats/:kind"),
        ]),
        Route::new("orgs/:org").children(vec![
            Route::new(""),
            Route::new("events"),
            Route::new("issues"),
            Route::new("members").children(vec![Route::new(""), Route::new(":user")]),
            Route::new("repos"),
            Route::new("teams"),
        ]),
        Route::new("users/:user").children(vec![
            Route::new(""),
            Route::new("events").children(vec![Route::new(""), Route::new("public"), Route::new("orgs/:org")]),
            Route::new("received_events").children(vec![Route::new(""), Route::new("public")]),
            Route::new("gists"),
            Route::new("followers"),
            Route::new("following").children(vec![Route::new(""), Route::new(":target")]),
            Route::new("keys"),
            Route::new("repos"),
            Route::new("starred"),
            Route::new("subscriptions"),
        ]),
        Route::new("gists").children(vec![
            Route::new(""),
            Route::new(":id").children(vec![Route::new(""), Route::new("star")]),
        ]),
        Route::new("legacy").redirect_to("/search"),
        Route::new("search").children(vec![
            Route::new(""),
            Route::new("repositories"),
            Route::new("code"),
            Route::new("issues"),
            Route::new("users"),
        ]),
        Route::new("**").data("page", "not-found"),
    ]
}

fn bench_paths() -> Vec<&'static str> {
    vec![
        "/authorizations",
        "/authorizations/17",
        "/applications/heavy-machinery/tokens/ab-33",
        "/events",
        "/repos/rust-lang/rust/events",
        "/repos/rust-lang/rust/issues/999/comments",
        "/repos/rust-lang/rust/branches/main",
        "/repos/rust-lang/rust/commits/deadbeef",
        "/repos/rust-lang/rust/git/trees/deadbeef",
        "/orgs/rust-lang/members/octocat",
        "/users/octocat/events/orgs/rust-lang",
        "/users/octocat/following/ferris",
        "/gists/42/star",
        "/search/repositories?q=router&page=2",
        "/definitely/not/configured/anywhere",
    ]
}

fn codec(c: &mut Criterion) {
    let paths = bench_paths();

    c.bench_function("parse", |b| {
        b.iter(|| {
            for path in black_box(&paths) {
                black_box(parse_url(path).unwrap());
            }
        })
    });

    let trees: Vec<_> = paths.iter().map(|p| parse_url(p).unwrap()).collect();
    c.bench_function("serialize", |b| {
        b.iter(|| {
            for tree in black_box(&trees) {
                black_box(tree.to_string());
            }
        })
    });
}

fn recognition(c: &mut Criterion) {
    let config = github_config();
    let trees: Vec<_> = bench_paths().iter().map(|p| parse_url(p).unwrap()).collect();

    c.bench_function("recognize", |b| {
        b.iter(|| {
            for tree in black_box(&trees) {
                black_box(recognize(&config, tree).unwrap());
            }
        })
    });
}

criterion_group!(benches, codec, recognition);
criterion_main!(benches);
