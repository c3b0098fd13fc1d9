//! Flat and aggregated feed reads.

#![allow(clippy::unwrap_used)]

mod support;

use stream_feed::{Activity, Feed, FeedKind, FeedQuery};
use support::{FakeFeedService, ScriptedTransport, query, signing_config};

#[tokio::test]
async fn test_flat_feed_reads_back_activities() {
    let service = FakeFeedService::new();
    let client = service.client(signing_config());
    let feed = client.flat_feed("flat", "bob").unwrap();

    for verb in ["post", "like", "share"] {
        feed.add_activity(&Activity::new("flat:john", verb, "flat:eric"))
            .await
            .unwrap();
    }

    let page = feed
        .activities(&FeedQuery::new().limit(2))
        .await
        .unwrap();
    let verbs: Vec<&str> = page.results.iter().map(|a| a.verb.as_str()).collect();
    assert_eq!(verbs, ["share", "like"]);

    let rest = feed
        .activities(&FeedQuery::new().limit(2).offset(2))
        .await
        .unwrap();
    assert_eq!(rest.results.len(), 1);
    assert_eq!(rest.results[0].verb, "post");
}

#[tokio::test]
async fn test_flat_feed_ranking_param() {
    let service = FakeFeedService::new();
    let client = service.client(signing_config());
    let feed = client.flat_feed("flat", "bob").unwrap();

    feed.activities(&FeedQuery::new().ranking("popularity"))
        .await
        .unwrap();

    let params = query(&service.last_request());
    assert_eq!(params.get("ranking").map(String::as_str), Some("popularity"));
}

#[tokio::test]
async fn test_aggregated_feed_decodes_groups() {
    let transport = ScriptedTransport::new();
    transport.respond(
        200,
        r#"{
            "duration": "4ms",
            "next": "/api/v1.0/feed/aggregated/bob/?id_lt=g1",
            "results": [{
                "id": "g1",
                "group": "post_2017-03-01",
                "verb": "post",
                "activity_count": 2,
                "actor_count": 1,
                "created_at": "2017-03-01T12:00:00.000000",
                "updated_at": "2017-03-01T12:05:00.000000",
                "activities": [
                    {"id": "a1", "actor": "flat:john", "verb": "post", "object": "flat:eric"},
                    {"id": "a2", "actor": "flat:john", "verb": "post", "object": "flat:carl"}
                ]
            }]
        }"#,
    );
    let client = transport.client(signing_config());
    let feed = client.aggregated_feed("aggregated", "bob").unwrap();
    assert_eq!(feed.kind(), FeedKind::Aggregated);

    let output = feed.activities(&FeedQuery::new()).await.unwrap();

    assert_eq!(output.results.len(), 1);
    let group = &output.results[0];
    assert_eq!(group.activity_count, 2);
    assert_eq!(group.activities[1].object.as_str(), "flat:carl");
    assert!(output.next.unwrap().contains("id_lt=g1"));
    assert_eq!(
        transport.requests()[0].url.path(),
        "/api/v1.0/feed/aggregated/bob/"
    );
}

#[tokio::test]
async fn test_feeds_can_be_used_through_trait_objects() {
    let service = FakeFeedService::new();
    let client = service.client(signing_config());
    let feeds: Vec<Box<dyn Feed>> = vec![
        Box::new(client.flat_feed("flat", "bob").unwrap()),
        Box::new(client.aggregated_feed("aggregated", "bob").unwrap()),
        Box::new(client.notification_feed("notification", "bob").unwrap()),
    ];

    for feed in &feeds {
        feed.add_activity(&Activity::new("flat:john", "post", "flat:eric"))
            .await
            .unwrap();
    }

    assert_eq!(service.stored("flat:bob").len(), 1);
    assert_eq!(service.stored("aggregated:bob").len(), 1);
    assert_eq!(service.stored("notification:bob").len(), 1);
}

#[tokio::test]
async fn test_concurrent_feeds_share_a_client() {
    let service = FakeFeedService::new();
    let client = service.client(signing_config());

    let mut tasks = Vec::new();
    for user in ["u1", "u2", "u3", "u4"] {
        let feed = client.flat_feed("flat", user).unwrap();
        tasks.push(tokio::spawn(async move {
            feed.add_activity(&Activity::new("flat:john", "post", "flat:eric"))
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(service.request_count(), 4);
    assert_eq!(service.stored("flat:u3").len(), 1);
}
