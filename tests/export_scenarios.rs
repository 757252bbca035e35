//! End-to-end export scenarios on the headless platform

use async_trait::async_trait;
use leilao_cartaz::card::{CardImage, CartazResumo, RenderTarget};
use leilao_cartaz::export::Exporter;
use leilao_cartaz::platform::device::{DESKTOP_CHROME_UA, IPHONE_UA};
use leilao_cartaz::platform::{HeadlessPlatform, PlatformEvent, ShareBehavior, ShareSupport};
use leilao_cartaz::rendering::CardRasterizer;
use leilao_cartaz::{
    new_exporter, DeliveryStrategy, Error, ExportConfig, ExportOutcome, ExportState, RasterImage, RasterOptions,
    Rasterizer, Result,
};
use sha2::{Digest, Sha256};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

const ALERT: &str = "Não foi possível gerar a imagem. Tente novamente.";

fn target() -> RenderTarget {
    RenderTarget::new(CartazResumo::default())
}

fn exporter(platform: &Arc<HeadlessPlatform>) -> Exporter {
    Exporter::new(platform.clone(), Arc::new(CardRasterizer::new()), ExportConfig::default())
}

async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

fn url_events(p: &HeadlessPlatform) -> usize {
    p.count(|e| matches!(e, PlatformEvent::ObjectUrlCreated { .. }))
}

struct FailingRasterizer;

#[async_trait]
impl Rasterizer for FailingRasterizer {
    async fn rasterize(&self, _: &RenderTarget, _: &RasterOptions) -> Result<RasterImage> {
        Err(Error::RasterizationFailed("capture rejected".into()))
    }
}

/// Blocks inside `rasterize` until released
struct GatedRasterizer {
    started: Notify,
    release: Notify,
    inner: CardRasterizer,
}

#[async_trait]
impl Rasterizer for GatedRasterizer {
    async fn rasterize(&self, target: &RenderTarget, options: &RasterOptions) -> Result<RasterImage> {
        self.started.notify_one();
        self.release.notified().await;
        self.inner.render(target, options)
    }
}

#[tokio::test(start_paused = true)]
async fn iphone_without_share_opens_new_tab() {
    let platform = Arc::new(HeadlessPlatform::builder().user_agent(IPHONE_UA).build());
    let exp = exporter(&platform);

    let outcome = exp.export_and_share(&target()).await;
    assert_eq!(outcome, ExportOutcome::Delivered(DeliveryStrategy::OpenInNewTab));

    let opened: Vec<(String, String)> = platform
        .events()
        .into_iter()
        .filter_map(|e| match e {
            PlatformEvent::TabOpened { url, features, .. } => Some((url, features)),
            _ => None,
        })
        .collect();
    assert_eq!(opened.len(), 1);
    assert!(opened[0].0.starts_with("blob:"));
    assert_eq!(opened[0].1, "noopener");
    assert_eq!(platform.count(|e| matches!(e, PlatformEvent::AnchorCreated { .. })), 0);
    assert_eq!(platform.delivered().len(), 1);
    assert!(platform.alerts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn new_tab_url_is_revoked_after_sixty_seconds_never_before() {
    let platform = Arc::new(HeadlessPlatform::builder().user_agent(IPHONE_UA).build());
    let exp = exporter(&platform);
    exp.export_and_share(&target()).await;
    assert_eq!(platform.live_object_urls().len(), 1);

    tokio::time::advance(Duration::from_secs(59)).await;
    settle().await;
    assert_eq!(platform.live_object_urls().len(), 1);

    tokio::time::advance(Duration::from_secs(2)).await;
    settle().await;
    assert!(platform.live_object_urls().is_empty());

    let timeline = platform.timeline();
    let created = timeline
        .iter()
        .find(|(_, e)| matches!(e, PlatformEvent::ObjectUrlCreated { .. }))
        .map(|(t, _)| *t)
        .unwrap();
    let revoked = timeline
        .iter()
        .find(|(_, e)| matches!(e, PlatformEvent::ObjectUrlRevoked { .. }))
        .map(|(t, _)| *t)
        .unwrap();
    assert!(revoked - created >= Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn desktop_share_with_accepted_check_shares_one_file() {
    let platform = Arc::new(
        HeadlessPlatform::builder()
            .user_agent(DESKTOP_CHROME_UA)
            .share(ShareSupport::Checked { accepts: true })
            .build(),
    );
    let exp = exporter(&platform);

    let outcome = exp.export_and_share(&target()).await;
    assert_eq!(outcome, ExportOutcome::Delivered(DeliveryStrategy::NativeShare));

    let shared: Vec<PlatformEvent> = platform
        .events()
        .into_iter()
        .filter(|e| matches!(e, PlatformEvent::Shared { .. }))
        .collect();
    assert_eq!(
        shared,
        vec![PlatformEvent::Shared {
            title: Some("Resumo do Leilão".into()),
            text: Some(ExportConfig::default().share_text),
            files: vec!["resumo-leilao.png".into()],
        }]
    );
    assert_eq!(url_events(&platform), 0);
    let delivered = platform.delivered();
    assert_eq!(delivered[0].mime, "image/png");
    assert_eq!(&delivered[0].bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[tokio::test(start_paused = true)]
async fn rasterization_failure_alerts_once() {
    let platform = Arc::new(HeadlessPlatform::default());
    let mut exp = Exporter::new(platform.clone(), Arc::new(FailingRasterizer), ExportConfig::default());
    let states = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&states);
    exp.on_state_change(move |st| s.lock().unwrap().push(st));

    let outcome = exp.export_and_share(&target()).await;
    assert!(matches!(outcome, ExportOutcome::Failed(ref msg) if msg.contains("capture rejected")));
    assert_eq!(platform.alerts(), vec![ALERT.to_string()]);
    assert_eq!(exp.state(), ExportState::Idle);
    assert_eq!(*states.lock().unwrap(), vec![ExportState::Busy, ExportState::Idle]);
    assert_eq!(url_events(&platform), 0);
}

#[tokio::test(start_paused = true)]
async fn tainted_card_image_fails_the_export() {
    let platform = Arc::new(HeadlessPlatform::default());
    let exp = exporter(&platform);
    let tainted = target().with_fundo(CardImage::cross_origin(vec![0xff, 0xd8, 0xff], "image/jpeg"));

    let outcome = exp.export_and_share(&tainted).await;
    assert!(matches!(outcome, ExportOutcome::Failed(_)));
    assert_eq!(platform.alerts().len(), 1);
    assert_eq!(url_events(&platform), 0);
}

#[tokio::test(start_paused = true)]
async fn cancelled_share_is_silent_and_has_no_fallback() {
    let platform = Arc::new(
        HeadlessPlatform::builder()
            .share(ShareSupport::Unchecked)
            .share_behavior(ShareBehavior::Dismiss)
            .build(),
    );
    let exp = exporter(&platform);

    let outcome = exp.export_and_share(&target()).await;
    assert_eq!(outcome, ExportOutcome::Dismissed);
    assert!(platform.alerts().is_empty());
    assert_eq!(exp.state(), ExportState::Idle);
    assert_eq!(url_events(&platform), 0);
    assert_eq!(platform.count(|e| matches!(e, PlatformEvent::AnchorCreated { .. })), 0);
    assert_eq!(platform.count(|e| matches!(e, PlatformEvent::TabOpened { .. })), 0);
    assert!(platform.delivered().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failing_share_alerts_without_fallback() {
    let platform = Arc::new(
        HeadlessPlatform::builder()
            .share(ShareSupport::Checked { accepts: true })
            .share_behavior(ShareBehavior::Fail("sheet crashed".into()))
            .build(),
    );
    let exp = exporter(&platform);

    let outcome = exp.export_and_share(&target()).await;
    assert!(matches!(outcome, ExportOutcome::Failed(_)));
    assert_eq!(platform.alerts(), vec![ALERT.to_string()]);
    assert_eq!(url_events(&platform), 0);
}

#[tokio::test(start_paused = true)]
async fn missing_shareability_check_still_shares() {
    let platform = Arc::new(HeadlessPlatform::builder().user_agent(IPHONE_UA).share(ShareSupport::Unchecked).build());
    let exp = exporter(&platform);
    let outcome = exp.export_and_share(&target()).await;
    assert_eq!(outcome, ExportOutcome::Delivered(DeliveryStrategy::NativeShare));
    assert_eq!(platform.count(|e| matches!(e, PlatformEvent::Shared { .. })), 1);
}

#[tokio::test(start_paused = true)]
async fn refused_check_on_desktop_downloads() {
    let platform = Arc::new(HeadlessPlatform::builder().share(ShareSupport::Checked { accepts: false }).build());
    let exp = exporter(&platform);
    let outcome = exp.export_and_share(&target()).await;
    assert_eq!(outcome, ExportOutcome::Delivered(DeliveryStrategy::ProgrammaticDownload));
    assert_eq!(platform.count(|e| matches!(e, PlatformEvent::Shared { .. })), 0);
}

#[tokio::test(start_paused = true)]
async fn download_removes_anchor_and_revokes_after_ten_seconds() {
    let platform = Arc::new(HeadlessPlatform::default());
    let exp = exporter(&platform);

    let outcome = exp.export_and_share(&target()).await;
    assert_eq!(outcome, ExportOutcome::Delivered(DeliveryStrategy::ProgrammaticDownload));
    assert_eq!(platform.attached_anchors(), 0);

    let anchor_events: Vec<PlatformEvent> = platform
        .events()
        .into_iter()
        .skip_while(|e| !matches!(e, PlatformEvent::AnchorCreated { .. }))
        .collect();
    assert!(matches!(&anchor_events[0], PlatformEvent::AnchorCreated { download, .. } if download == "resumo-leilao.png"));
    assert!(matches!(anchor_events[1], PlatformEvent::AnchorAppended(_)));
    assert!(matches!(anchor_events[2], PlatformEvent::AnchorClicked(_)));
    assert!(matches!(anchor_events[3], PlatformEvent::AnchorRemoved(_)));
    assert_eq!(anchor_events.len(), 4);

    tokio::time::advance(Duration::from_secs(9)).await;
    settle().await;
    assert_eq!(platform.live_object_urls().len(), 1);

    tokio::time::advance(Duration::from_secs(2)).await;
    settle().await;
    assert!(platform.live_object_urls().is_empty());
    assert_eq!(exp.pending_cleanup(), 0);
}

#[tokio::test]
async fn second_call_while_busy_is_refused() {
    let platform = Arc::new(HeadlessPlatform::default());
    let gate = Arc::new(GatedRasterizer { started: Notify::new(), release: Notify::new(), inner: CardRasterizer::new() });
    let mut exp = Exporter::new(platform.clone(), gate.clone(), ExportConfig::default());
    let states = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&states);
    exp.on_state_change(move |st| s.lock().unwrap().push(st));
    let exp = Arc::new(exp);

    let first = {
        let exp = Arc::clone(&exp);
        tokio::spawn(async move { exp.export_and_share(&target()).await })
    };
    gate.started.notified().await;
    assert_eq!(exp.state(), ExportState::Busy);
    assert_eq!(exp.export_and_share(&target()).await, ExportOutcome::Busy);

    gate.release.notify_one();
    let outcome = first.await.unwrap();
    assert_eq!(outcome, ExportOutcome::Delivered(DeliveryStrategy::ProgrammaticDownload));
    assert_eq!(*states.lock().unwrap(), vec![ExportState::Busy, ExportState::Idle]);
    assert_eq!(url_events(&platform), 1);
}

#[tokio::test]
async fn sequential_exports_produce_identical_assets() {
    let platform = Arc::new(HeadlessPlatform::default());
    let exp = new_exporter(platform.clone(), ExportConfig::default()).unwrap();

    for _ in 0..2 {
        let outcome = exp.export_and_share(&target()).await;
        assert_eq!(outcome, ExportOutcome::Delivered(DeliveryStrategy::ProgrammaticDownload));
    }
    let delivered = platform.delivered();
    assert_eq!(delivered.len(), 2);
    assert_eq!(hex::encode(Sha256::digest(&delivered[0].bytes)), hex::encode(Sha256::digest(&delivered[1].bytes)));

    let created: Vec<String> = platform
        .events()
        .into_iter()
        .filter_map(|e| match e {
            PlatformEvent::ObjectUrlCreated { url, .. } => Some(url),
            _ => None,
        })
        .collect();
    assert_eq!(created.len(), 2);
    assert_ne!(created[0], created[1]);
}

#[tokio::test(start_paused = true)]
async fn scrolled_page_exports_the_same_image() {
    let still = Arc::new(HeadlessPlatform::default());
    let scrolled = Arc::new(HeadlessPlatform::builder().scroll_y(420.0).build());
    exporter(&still).export_and_share(&target()).await;
    exporter(&scrolled).export_and_share(&target()).await;
    assert_eq!(still.delivered()[0].bytes, scrolled.delivered()[0].bytes);
}
