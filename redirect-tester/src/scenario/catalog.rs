use super::{
    ClipboardSetup, DESKTOP_UA, Expectation, ExpectedNav, IPHONE_UA, Scenario, ScenarioSetup,
};

const CAMPAIGN: &str = "babyeinsteinE1";
const DEFAULT: &str = "default";
const WINDOWS_PHONE_UA: &str = "Mozilla/5.0 (Mobile; Windows Phone 8.1; Android 4.0; ARM; \
     Trident/7.0; Touch; rv:11.0; IEMobile/11.0; NOKIA; Lumia 635) like iPhone OS 7_0_3 Mac OS X \
     AppleWebKit/537 (KHTML, like Gecko) Mobile Safari/537";

fn expect(
    navigations: Vec<ExpectedNav>,
    final_state: &'static str,
    elapsed_ms: Option<u64>,
) -> Expectation {
    Expectation {
        navigations,
        final_state: Some(final_state),
        elapsed_ms,
    }
}

fn app_then_store(code: &'static str) -> Vec<ExpectedNav> {
    vec![ExpectedNav::AppUri(code), ExpectedNav::Store(code)]
}

#[must_use]
pub fn catalog_scenarios() -> Vec<Scenario> {
    let campaign_query = format!("?ref={CAMPAIGN}");
    vec![
        Scenario {
            key: "desktop-default",
            description: "Desktop visitor without a ref goes straight to the default listing",
            setup: ScenarioSetup::new("", DESKTOP_UA),
            expect: expect(vec![ExpectedNav::Store(DEFAULT)], "navigated", Some(0)),
        },
        Scenario {
            key: "desktop-campaign",
            description: "Desktop visitor with a campaign ref goes to the campaign listing",
            setup: ScenarioSetup::new(&campaign_query, DESKTOP_UA),
            expect: expect(vec![ExpectedNav::Store(CAMPAIGN)], "navigated", Some(0)),
        },
        Scenario {
            key: "iphone-campaign",
            description: "iPhone copies the code, tries the app, then the campaign listing",
            setup: ScenarioSetup::new(&campaign_query, IPHONE_UA),
            expect: expect(app_then_store(CAMPAIGN), "navigated", Some(2_500)),
        },
        Scenario {
            key: "iphone-unknown-ref",
            description: "Unknown ref is still copied but resolves to the default listing",
            setup: ScenarioSetup::new("?ref=unknown123", IPHONE_UA),
            expect: Expectation {
                navigations: vec![
                    ExpectedNav::AppUri("unknown123"),
                    ExpectedNav::Store("unknown123"),
                ],
                final_state: Some("navigated"),
                elapsed_ms: Some(2_500),
            },
        },
        Scenario {
            key: "iphone-async-missing",
            description: "Missing async clipboard falls back to the selection command",
            setup: ScenarioSetup::new(&campaign_query, IPHONE_UA)
                .clipboard(ClipboardSetup::AsyncMissing),
            expect: expect(app_then_store(CAMPAIGN), "navigated", Some(2_500)),
        },
        Scenario {
            key: "iphone-copy-retried",
            description: "Copy succeeds on the third attempt after backoff",
            setup: ScenarioSetup::new(&campaign_query, IPHONE_UA)
                .clipboard(ClipboardSetup::Flaky(2)),
            expect: expect(app_then_store(CAMPAIGN), "navigated", Some(3_400)),
        },
        Scenario {
            key: "iphone-copy-denied",
            description: "Every copy technique fails and the visitor is asked to copy manually",
            setup: ScenarioSetup::new(&campaign_query, IPHONE_UA)
                .clipboard(ClipboardSetup::Denied),
            expect: expect(Vec::new(), "manual-fallback", Some(900)),
        },
        Scenario {
            key: "iphone-manual-resume",
            description: "Manual continue after a failed copy still tries the app, then the store",
            setup: ScenarioSetup::new(&campaign_query, IPHONE_UA)
                .clipboard(ClipboardSetup::Denied)
                .resuming_manually(),
            expect: expect(app_then_store(CAMPAIGN), "navigated", Some(1_900)),
        },
        Scenario {
            key: "staging-host",
            description: "Non-production hosts skip the app URI",
            setup: ScenarioSetup::new(&campaign_query, IPHONE_UA)
                .on_host("ec2-3-91-10-4.compute-1.amazonaws.com"),
            expect: expect(vec![ExpectedNav::Store(CAMPAIGN)], "navigated", Some(1_500)),
        },
        Scenario {
            key: "windows-phone",
            description: "Windows Phone claiming to be an iPhone is sent straight to the store",
            setup: ScenarioSetup::new(&campaign_query, WINDOWS_PHONE_UA),
            expect: expect(vec![ExpectedNav::Store(CAMPAIGN)], "navigated", Some(0)),
        },
        Scenario {
            key: "impersonating-browser",
            description: "Browser exposing MSStream is treated as a non-target platform",
            setup: ScenarioSetup::new(&campaign_query, IPHONE_UA).impersonating(),
            expect: expect(vec![ExpectedNav::Store(CAMPAIGN)], "navigated", Some(0)),
        },
        Scenario {
            key: "ua-unreadable",
            description: "Unreadable user agent recovers with a single store navigation",
            setup: ScenarioSetup::new(&campaign_query, IPHONE_UA).without_user_agent(),
            expect: expect(vec![ExpectedNav::Store(CAMPAIGN)], "navigated", Some(0)),
        },
        Scenario {
            key: "app-uri-refused",
            description: "A refused app URI still ends on the store listing",
            setup: ScenarioSetup::new(&campaign_query, IPHONE_UA).refusing_app_uri(),
            expect: expect(app_then_store(CAMPAIGN), "navigated", Some(1_500)),
        },
    ]
}

#[must_use]
pub fn find_scenario(key: &str) -> Option<Scenario> {
    catalog_scenarios()
        .into_iter()
        .find(|scenario| scenario.key == key)
}

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog_scenarios()
        .into_iter()
        .map(|scenario| (scenario.key, scenario.description))
        .collect()
}
