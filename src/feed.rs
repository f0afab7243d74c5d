use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{debug, error, info};
use regex::Regex;
use reqwest::Client;

use crate::error::{CalendarError, Result};
use crate::models::{FeedDate, FeedItem};
use crate::xml::{self, ParserOptions, XmlValue};

static DATE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").unwrap());

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Value processor turning `YYYY-MM-DD...` leaves into dates. Anything else is
/// returned untouched, and a bad remainder yields `FeedDate::Invalid` rather
/// than an error.
pub fn parse_date(value: XmlValue) -> XmlValue {
    match value {
        XmlValue::Text(s) if DATE_PREFIX.is_match(&s) => match parse_timestamp(&s) {
            Some(dt) => XmlValue::Date(FeedDate::Valid(dt)),
            None => XmlValue::Date(FeedDate::Invalid(s)),
        },
        other => other,
    }
}

fn feed_parser_options() -> ParserOptions {
    ParserOptions {
        value_processors: vec![parse_date],
        ..Default::default()
    }
}

fn text_field(item: &XmlValue, key: &str) -> Option<String> {
    item.get(key).and_then(XmlValue::as_text).map(str::to_string)
}

fn date_field(item: &XmlValue, key: &str) -> Option<FeedDate> {
    match item.get(key)? {
        XmlValue::Date(d) => Some(d.clone()),
        XmlValue::Text(s) => Some(FeedDate::Invalid(s.clone())),
        _ => None,
    }
}

fn feed_item(item: &XmlValue) -> FeedItem {
    FeedItem {
        title: text_field(item, "title"),
        description: text_field(item, "description"),
        link: text_field(item, "link"),
        location: text_field(item, "location"),
        localstartdate: date_field(item, "localstartdate"),
        localenddate: date_field(item, "localenddate"),
        gameid: text_field(item, "gameid"),
        gamepromoname: text_field(item, "gamepromoname"),
    }
}

/// Decode an RSS body and return its `channel.item` entries.
pub fn decode_items(body: &str) -> Result<Vec<FeedItem>> {
    let tree = xml::parse(body, &feed_parser_options())?;

    let items = tree
        .get("channel")
        .and_then(|channel| channel.get("item"))
        .cloned()
        .ok_or_else(|| CalendarError::Decode("feed has no channel.item collection".to_string()))?;

    Ok(items.into_list().iter().map(feed_item).collect())
}

/// Fetch the schedule feed with a single GET and decode its items.
pub async fn request_games(client: &Client, url: &str) -> Result<Vec<FeedItem>> {
    debug!("Requesting schedule feed from {}", url);

    let response = client.get(url).send().await.map_err(|e| {
        error!("Feed request to {} failed: {}", url, e);
        CalendarError::Fetch { url: url.to_string(), reason: e.to_string() }
    })?;

    let status = response.status();
    if !status.is_success() {
        error!("Feed request to {} returned {}", url, status);
        return Err(CalendarError::Fetch { url: url.to_string(), reason: format!("status {}", status) });
    }

    let body = response
        .text()
        .await
        .map_err(|e| CalendarError::Fetch { url: url.to_string(), reason: e.to_string() })?;

    let items = decode_items(&body)?;
    info!("Fetched {} feed items from {}", items.len(), url);

    Ok(items)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    pub(crate) const FIXTURE_RSS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<rss version="2.0" xmlns:s="http://gocards.com/schemas">
  <channel>
    <title>GoCards.com Calendar</title>
    <item>
      <title>3/9 2:00 PM [L] University of Louisville Men's Basketball vs  Duke</title>
      <description>[L] University of Louisville Men's Basketball vs  Duke\nL 81-77\nTV: ESPN/ACC Network\nStreaming Video: http://es.pn/2l4X8k0\nStreaming Audio: http://gocards.com/showcase?Live=609\n http://gocards.com/calendar.aspx?id=13548</description>
      <link>http://gocards.com/calendar.aspx?id=13548</link>
      <s:location>Brooklyn, NY (Barclays Center)</s:location>
      <s:localstartdate>2017-03-09T14:00:00.0000000</s:localstartdate>
      <s:localenddate>2017-03-09T16:00:00.0000000</s:localenddate>
      <s:gameid>13548</s:gameid>
      <s:gamepromoname />
    </item>
    <item>
      <title>4/1 [N] University of Louisville Women's Rowing  Double Dual (Indiana, Iowa, Kansas)</title>
      <description>[N] University of Louisville Women's Rowing  Double Dual (Indiana, Iowa, Kansas)\nN - 7 Wins\n http://gocards.com/calendar.aspx?id=13921</description>
      <link>http://gocards.com/calendar.aspx?id=13921</link>
      <s:location>Bloomington, Ind.</s:location>
      <s:localstartdate>2017-04-01T00:00:00.0000000</s:localstartdate>
      <s:localenddate>2017-04-01T00:00:00.0000000</s:localenddate>
      <s:gameid>13921</s:gameid>
    </item>
    <item>
      <title>4/8 1:00 PM [W] University of Louisville Baseball vs  PITTSBURGH</title>
      <description>[W] University of Louisville Baseball vs  PITTSBURGH\nW 3-0\nTV: ACC Network Extra\nRadio: TuneIn/93.9 The Ville\n http://gocards.com/calendar.aspx?id=13763</description>
      <link>http://gocards.com/calendar.aspx?id=13763</link>
      <s:location>Louisville, Ky.</s:location>
      <s:localstartdate>2017-04-08T13:00:00.0000000</s:localstartdate>
      <s:localenddate>2017-04-08T16:00:00.0000000</s:localenddate>
      <s:gameid>13763</s:gameid>
      <s:gamepromoname>Bark in the Park</s:gamepromoname>
    </item>
    <item>
      <title>TBA University of Louisville Men's Soccer at  Clemson</title>
      <description>University of Louisville Men's Soccer at  Clemson\n http://gocards.com/calendar.aspx?id=14001</description>
      <link>http://gocards.com/calendar.aspx?id=14001</link>
      <s:localstartdate>2017-04-0xTBA</s:localstartdate>
      <s:gameid>14001</s:gameid>
    </item>
  </channel>
</rss>"#;

    pub(crate) fn local_client() -> Client {
        Client::builder().no_proxy().build().unwrap()
    }

    /// Serve one canned HTTP response on a local port and return its URL.
    pub(crate) async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/rss+xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{}/calendar.ashx/calendar.rss", addr)
    }

    #[test]
    fn test_parse_date_recognizes_date_prefixes() {
        let expected = NaiveDate::from_ymd_opt(2017, 3, 9).unwrap().and_hms_opt(14, 0, 0).unwrap();

        assert_eq!(
            parse_date(XmlValue::Text("2017-03-09T14:00:00.0000000".to_string())),
            XmlValue::Date(FeedDate::Valid(expected))
        );
        assert_eq!(
            parse_date(XmlValue::Text("2017-03-09T19:00:00.0000000Z".to_string())),
            XmlValue::Date(FeedDate::Valid(expected + chrono::Duration::hours(5)))
        );
        assert_eq!(
            parse_date(XmlValue::Text("2017-03-09".to_string())),
            XmlValue::Date(FeedDate::Valid(expected - chrono::Duration::hours(14)))
        );
    }

    #[test]
    fn test_parse_date_passes_other_values_through() {
        let text = XmlValue::Text("3/9 2:00 PM".to_string());
        assert_eq!(parse_date(text.clone()), text);
        assert_eq!(parse_date(XmlValue::Null), XmlValue::Null);
    }

    #[test]
    fn test_parse_date_keeps_malformed_remainders_as_invalid() {
        assert_eq!(
            parse_date(XmlValue::Text("2017-04-0xTBA".to_string())),
            XmlValue::Text("2017-04-0xTBA".to_string())
        );
        assert_eq!(
            parse_date(XmlValue::Text("2017-04-31T25:99".to_string())),
            XmlValue::Date(FeedDate::Invalid("2017-04-31T25:99".to_string()))
        );
    }

    #[test]
    fn test_decode_items_reads_structural_fields() {
        let items = decode_items(FIXTURE_RSS).unwrap();
        assert_eq!(items.len(), 4);

        let duke = &items[0];
        assert_eq!(duke.gameid.as_deref(), Some("13548"));
        assert_eq!(duke.location.as_deref(), Some("Brooklyn, NY (Barclays Center)"));
        assert_eq!(duke.gamepromoname, None);
        assert!(duke.description.as_deref().unwrap().contains(r"\nL 81-77"));
        assert!(matches!(duke.localstartdate, Some(FeedDate::Valid(_))));

        assert_eq!(items[3].localstartdate, Some(FeedDate::Invalid("2017-04-0xTBA".to_string())));
        assert_eq!(items[3].localenddate, None);
    }

    #[test]
    fn test_decode_items_requires_item_collection() {
        let result = decode_items("<rss><channel><title>Empty</title></channel></rss>");
        assert!(matches!(result, Err(CalendarError::Decode(_))));
    }

    #[tokio::test]
    async fn test_request_games_decodes_feed() {
        let url = serve_once("200 OK", FIXTURE_RSS).await;
        let items = request_games(&local_client(), &url).await.unwrap();
        assert_eq!(items.len(), 4);
    }

    #[tokio::test]
    async fn test_request_games_fails_on_error_status() {
        let url = serve_once("404 Not Found", "nope").await;
        match request_games(&local_client(), &url).await {
            Err(CalendarError::Fetch { url: failed, reason }) => {
                assert_eq!(failed, url);
                assert!(reason.contains("404"));
            }
            other => panic!("expected fetch error, got {:?}", other),
        }
    }
}
