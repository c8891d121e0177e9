use leptos::*;

use crate::analytics::{format_minutes, rank_artists, DashboardMetrics};

const TOP_ARTISTS: usize = 10;
const COLORS: [&str; 6] = ["#0088FE", "#00C49F", "#FFBB28", "#FF8042", "#8884d8", "#82ca9d"];

fn bar_height(value: f64, max: f64) -> f64 {
    if max <= 0.0 { 0.0 } else { (value / max * 100.0).clamp(0.0, 100.0) }
}

fn max_of(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0, f64::max)
}

#[component]
pub fn ListeningCharts(metrics: Memo<DashboardMetrics>) -> impl IntoView {
    move || {
        let m = metrics.get();
        let artists = rank_artists(m.artists.clone(), TOP_ARTISTS);

        view! {
            <div style="display: flex; flex-direction: column; gap: 30px; padding-bottom: 50px;">

                // 1. Monthly listening time
                <section class="card">
                    <h3 class="stat-label">"Monthly Listening Time"</h3>
                    <div style="display: flex; align-items: flex-end; gap: 6px; height: 160px; margin-top: 15px;">
                        {let max = max_of(m.monthly.iter().map(|x| x.minutes));
                         m.monthly.iter().map(|stat| {
                            let h = bar_height(stat.minutes, max);
                            view! {
                                <div style="flex: 1; display: flex; flex-direction: column; height: 100%; justify-content: flex-end; align-items: center; gap: 4px;">
                                    <div style=format!("width: 100%; height: {}%; background: var(--primary); border-radius: 4px 4px 0 0;", h)
                                        title=format!("{}: {}", stat.month, format_minutes(stat.minutes))></div>
                                    <span style="font-size: 0.5rem; font-weight: bold; color: #a89984;">{stat.month.clone()}</span>
                                </div>
                            }
                        }).collect_view()}
                    </div>
                </section>

                // 2. Monthly skip rate
                <section class="card">
                    <h3 class="stat-label">"Monthly Skip Rate"</h3>
                    <div style="display: flex; flex-direction: column; gap: 8px; margin-top: 15px;">
                        {m.monthly_skips.iter().map(|stat| {
                            view! {
                                <div style="display: flex; flex-direction: column; gap: 4px;">
                                    <div style="display: flex; justify-content: space-between; font-size: 0.7rem;">
                                        <span>{stat.month.clone()}</span>
                                        <span style="color: var(--accent); font-weight: bold;">
                                            {format!("{:.1}% ({}/{})", stat.skip_rate, stat.skipped, stat.total)}
                                        </span>
                                    </div>
                                    <div style="height: 8px; background: var(--surface); border-radius: 4px; overflow: hidden;">
                                        <div style=format!("width: {}%; height: 100%; background: var(--accent);", stat.skip_rate)></div>
                                    </div>
                                </div>
                            }
                        }).collect_view()}
                    </div>
                </section>

                <div class="grid-container" style="grid-template-columns: 1fr 1fr; gap: 20px;">
                    // 3. Time of day
                    <section class="card">
                        <h3 class="stat-label">"Listening by Time of Day"</h3>
                        <div style="display: flex; align-items: flex-end; gap: 2px; height: 100px; margin-top: 15px;">
                            {let max = max_of(m.hourly.iter().map(|x| x.minutes));
                             m.hourly.iter().map(|stat| {
                                let h = bar_height(stat.minutes, max);
                                view! { <div style=format!("flex: 1; height: {}%; background: var(--secondary); border-radius: 1px;", h)
                                    title=format!("{} - {}", stat.label, format_minutes(stat.minutes))></div> }
                            }).collect_view()}
                        </div>
                    </section>

                    // 4. Longest gap
                    <section class="card">
                        <h3 class="stat-label">"Longest Break Between Plays"</h3>
                        {match &m.longest_gap {
                            Some(gap) => view! {
                                <div style="margin-top: 15px;">
                                    <div style="font-size: 1.6rem; font-weight: 900;">{format_minutes(gap.minutes)}</div>
                                    <div style="font-size: 0.7rem; color: #a89984;">
                                        {format!("{} → {}", gap.start.format("%b %d, %Y %H:%M"), gap.end.format("%b %d, %Y %H:%M"))}
                                    </div>
                                </div>
                            }.into_view(),
                            None => view! { <p style="font-size: 0.7rem;">"Not enough plays yet."</p> }.into_view(),
                        }}
                    </section>
                </div>

                // 5. Top artists
                <section class="card">
                    <h3 class="stat-label">"Top Artists by Listening Time"</h3>
                    <div style="display: flex; height: 30px; border-radius: 15px; overflow: hidden; margin-top: 15px;">
                        {let total: f64 = artists.iter().map(|a| a.minutes).sum();
                         artists.iter().enumerate().map(|(i, a)| {
                            let w = bar_height(a.minutes, total);
                            view! { <div style=format!("width: {}%; background: {}; height: 100%;", w, COLORS[i % COLORS.len()])
                                title=format!("{}: {}", a.artist, format_minutes(a.minutes))></div> }
                        }).collect_view()}
                    </div>
                    <div style="display: flex; flex-direction: column; gap: 6px; margin-top: 10px;">
                        {artists.iter().enumerate().map(|(i, a)| view! {
                            <div style="display: flex; justify-content: space-between; font-size: 0.8rem;">
                                <span style=format!("color: {}; font-weight: bold;", COLORS[i % COLORS.len()])>{a.artist.clone()}</span>
                                <span>{format_minutes(a.minutes)}</span>
                            </div>
                        }).collect_view()}
                    </div>
                </section>
            </div>
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_heights_are_percentages() {
        assert_eq!(bar_height(5.0, 10.0), 50.0);
        assert_eq!(bar_height(5.0, 0.0), 0.0);
        assert_eq!(max_of([1.0, 7.5, 3.0].into_iter()), 7.5);
        assert_eq!(max_of(std::iter::empty()), 0.0);
    }
}
