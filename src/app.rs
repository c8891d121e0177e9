//! Pages and routing for the browser build.
use chrono::Local;
use gloo_timers::future::TimeoutFuture;
use leptos::ev::SubmitEvent;
use leptos::*;
use web_sys::HtmlInputElement;

use crate::analytics::format_minutes;
use crate::api::SpotifyClient;
use crate::auth::{
    auth_cookie, authenticate, authorize_url, clear_auth_cookie, guard, return_path, take_access_token,
    RouteDecision, DASHBOARD_PATH, HELP_PATH, LOGIN_PATH,
};
use crate::browser;
use crate::charts::ListeningCharts;
use crate::config::AppConfig;
use crate::paging::SortMode;
use crate::session::{Action, Dashboard};
use crate::upload::ingest;

const PRIVACY_SETTINGS_URL: &str = "https://www.spotify.com/account/privacy/";
const FALLBACK_AVATAR: &str = "/img/avatar.png";

#[component]
pub fn App() -> impl IntoView {
    let path = browser::current_path();
    if let RouteDecision::Redirect(to) = guard(&path, &browser::cookies()) {
        tracing::info!(%path, %to, "not signed in, redirecting");
        browser::navigate(&to);
        return view! { <p>"Redirecting..."</p> }.into_view();
    }

    match path.trim_end_matches('/') {
        "" => view! { <Loading/> }.into_view(),
        LOGIN_PATH => view! { <LoginPage/> }.into_view(),
        DASHBOARD_PATH => view! { <DashboardPage/> }.into_view(),
        HELP_PATH => view! { <HowToPage/> }.into_view(),
        _ => view! {
            <div class="app-container">
                <h1>"Page not found"</h1>
                <a href=DASHBOARD_PATH>"Back to the dashboard"</a>
            </div>
        }
        .into_view(),
    }
}

#[component]
fn Loading() -> impl IntoView {
    spawn_local(async {
        TimeoutFuture::new(3_000).await;
        browser::navigate(DASHBOARD_PATH);
    });
    view! { <div>"Loading..."</div> }
}

#[component]
fn LoginPage() -> impl IntoView {
    let (email, set_email) = create_signal(String::new());
    let (password, set_password) = create_signal(String::new());
    let (error, set_error) = create_signal(None::<String>);

    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        match authenticate(&email.get_untracked(), &password.get_untracked()) {
            Ok(token) => {
                browser::set_cookie(&auth_cookie(&token));
                browser::navigate(&return_path(&browser::current_search()));
            }
            Err(e) => set_error.set(Some(e.to_string())),
        }
    };

    view! {
        <div class="app-container login">
            <section class="card">
                <h2>"Spotify Analytics Login"</h2>
                <form on:submit=on_submit>
                    <Show when=move || error.get().is_some()>
                        <div class="alert">{move || error.get().unwrap_or_default()}</div>
                    </Show>
                    <label for="email">"Email"</label>
                    <input id="email" type="email" placeholder="your@email.com" required=true
                        prop:value=email on:input=move |ev| set_email.set(event_target_value(&ev))/>
                    <label for="password">"Password"</label>
                    <input id="password" type="password" required=true
                        prop:value=password on:input=move |ev| set_password.set(event_target_value(&ev))/>
                    <button type="submit">"Sign in"</button>
                    <p class="hint">"Demo credentials: user@example.com / password123"</p>
                </form>
            </section>
        </div>
    }
}

#[component]
fn DashboardPage() -> impl IntoView {
    let config = AppConfig::from_build_env();
    let limit = config.recent_limit;
    let state = create_rw_signal(Dashboard::new(config.zone));
    let client = store_value(None::<SpotifyClient>);
    let authorize = store_value(authorize_url(&config));

    let dispatch = move |action: Action| state.update(|d| *d = d.update(action));

    let refresh = move || {
        let Some(api) = client.get_value() else { return };
        dispatch(Action::FetchStarted);
        let (request, profile_request) = state.with_untracked(|d| (d.latest_request(), d.profile_request()));
        spawn_local(async move {
            let profile = api.get_me().await.map_err(|e| e.to_string());
            dispatch(Action::ProfileFetched { request: profile_request, result: profile });
            let recent = api.get_recently_played_events(limit).await.map_err(|e| e.to_string());
            dispatch(Action::RecentFetched { request, result: recent });
        });
    };

    if let Some((token, clean)) = take_access_token(&browser::current_href()) {
        client.set_value(Some(SpotifyClient::new(&config, token.value)));
        browser::replace_url(&clean);
        refresh();
    }

    let connect = move |_| {
        authorize.with_value(|url| match url {
            Ok(url) => browser::navigate(url),
            Err(e) => tracing::warn!(error = %e, "cannot build Spotify authorize url"),
        })
    };

    let sign_out = move |_| {
        browser::set_cookie(&clear_auth_cookie());
        browser::navigate(LOGIN_PATH);
    };

    let on_upload = move |ev: web_sys::Event| {
        let input: HtmlInputElement = event_target(&ev);
        spawn_local(async move {
            let files = browser::read_files(&input).await;
            if files.is_empty() {
                return;
            }
            dispatch(Action::UploadFinished(ingest(files)));
        });
    };

    let metrics = create_memo(move |_| state.with(|d| d.metrics().clone()));
    let connected = move || client.with_value(|c| c.is_some());

    view! {
        <div class="app-container">
            <header style="display: flex; justify-content: space-between; align-items: center;">
                <h1>"Unwindify"</h1>
                <div style="display: flex; align-items: center; gap: 12px;">
                    {move || state.with(|d| d.profile().cloned()).map(|p| view! {
                        <img class="avatar" src=p.avatar_url().unwrap_or(FALLBACK_AVATAR).to_string() alt=p.initial()/>
                        <span>{p.display_name.clone().unwrap_or_default()}</span>
                    })}
                    <button on:click=sign_out>"Sign Out"</button>
                </div>
            </header>

            <section style="display: flex; flex-direction: column; align-items: center; gap: 12px; margin-top: 16px;">
                <Show
                    when=connected
                    fallback=move || view! { <button on:click=connect>"Connect Spotify to view your recent history"</button> }
                >
                    <button on:click=move |_| refresh() disabled=move || state.with(|d| d.loading())>
                        "Refresh Recent History"
                    </button>
                </Show>
                <p style="opacity: 0.5;">
                    "Or " <input type="file" accept=".json" multiple=true on:change=on_upload/> " your extended history"
                </p>
                <p style="opacity: 0.5;">
                    "Need Help? " <a href=HELP_PATH><em>"How to get my extended listening history?"</em></a>
                </p>
            </section>

            {move || state.with(|d| d.error().map(str::to_string)).map(|msg| view! {
                <div class="alert" style="display: flex; justify-content: space-between;">
                    <span>{msg}</span>
                    <button on:click=move |_| dispatch(Action::DismissError)>"Dismiss"</button>
                </div>
            })}

            {move || state.with(|d| {
                d.upload_failures().iter().map(|f| view! {
                    <div class="alert">{format!("Skipped {}: {}", f.file, f.reason)}</div>
                }).collect_view()
            })}

            <section class="card" style="margin-top: 24px;">
                <h3 class="stat-label">"Your Spotify Listening History"</h3>
                <div class="grid-container" style="grid-template-columns: 1fr 1fr; gap: 16px;">
                    <p>"Total Minutes Played: " {move || format!("{:.0}", metrics.with(|m| m.total_minutes))}</p>
                    <p>"Total Tracks Played: " {move || metrics.with(|m| m.total_plays)}</p>
                </div>
                <button on:click=move |_| dispatch(Action::ToggleGraphs)>
                    {move || if state.with(|d| d.show_graphs()) { "Hide Graphs" } else { "Show Graphs" }}
                </button>
            </section>

            <Show when=move || state.with(|d| d.show_graphs())>
                <ListeningCharts metrics=metrics/>
            </Show>

            <section class="card" style="margin-top: 24px;">
                <div style="display: flex; justify-content: space-between; align-items: center;">
                    <h3 class="stat-label">"Plays"</h3>
                    <button on:click=move |_| dispatch(Action::CycleSort)>
                        {move || format!("Sort: {}", state.with(|d| d.sort().label()))}
                    </button>
                </div>
                <HistoryTable state=state/>
                <div style="display: flex; justify-content: center; align-items: center; gap: 12px; margin-top: 12px;">
                    <button on:click=move |_| dispatch(Action::PreviousPage)>"Previous"</button>
                    <span>{move || state.with(|d| format!("Page {} of {}", d.page(), d.page_count().max(1)))}</span>
                    <button on:click=move |_| dispatch(Action::NextPage)>"Next"</button>
                </div>
            </section>
        </div>
    }
}

#[component]
fn HistoryTable(state: RwSignal<Dashboard>) -> impl IntoView {
    move || {
        state.with(|d| {
            let most_listened = d.sort() == SortMode::MostListened;
            d.current_page()
                .iter()
                .map(|e| {
                    let listens = d.listen_count(&e.track_uri).map(|c| (c.count, c.total_ms_played));
                    let when = e.timestamp.with_timezone(&Local).format("%B %-d, %Y").to_string();
                    view! {
                        <div style="display: flex; justify-content: space-between; border-bottom: 1px solid var(--surface); padding: 6px 0;">
                            <div style="flex: 1; overflow: hidden;">
                                <div style="font-weight: bold;">{e.track_name.clone()}</div>
                                <div style="font-size: 0.75rem;">
                                    {e.artist_name.clone()}
                                    {e.album_name.clone().map(|a| format!(" · {}", a))}
                                </div>
                            </div>
                            <div style="text-align: right; font-size: 0.75rem;">
                                {match (most_listened, listens) {
                                    (true, Some((count, ms))) => format!(
                                        "{} plays · {}", count, format_minutes(crate::models::ms_to_minutes(ms))
                                    ),
                                    _ => format!("{} · {:.1} min", when, e.minutes()),
                                }}
                            </div>
                        </div>
                    }
                })
                .collect_view()
        })
    }
}

#[component]
fn HowToPage() -> impl IntoView {
    let (show_steps, set_show_steps) = create_signal(false);
    let steps = [
        "Go to the Spotify Privacy Settings.",
        "Scroll down to the Download your data section and click Request Data.",
        "Ensure you select the Extended Streaming History option before submitting your request.",
        "Wait for Spotify to process your request. This may take a few days.",
        "Once you receive an email from Spotify, follow the link to download your data.",
    ];

    view! {
        <div class="app-container" style="max-width: 640px; text-align: center;">
            <h1>"How to Get Your Extended Streaming History from Spotify"</h1>
            <p>"Follow these steps to request and download your extended streaming history from Spotify."</p>
            <button on:click=move |_| set_show_steps.update(|s| *s = !*s)>
                {move || if show_steps.get() { "Hide Steps" } else { "Show Steps" }}
            </button>
            <Show when=move || show_steps.get()>
                <ol class="card" style="text-align: left;">
                    {steps.iter().map(|s| view! { <li>{*s}</li> }).collect_view()}
                </ol>
            </Show>
            <button on:click=move |_| browser::open_external(PRIVACY_SETTINGS_URL)>
                "Go to Spotify Privacy Settings"
            </button>
            <p><a href=DASHBOARD_PATH>"Back to the dashboard"</a></p>
        </div>
    }
}
