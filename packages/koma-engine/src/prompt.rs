use koma_domain::item::CatalogItem;

use crate::workflow::WorkflowState;

pub fn web_query(title: &str) -> String {
	format!("{title} manga")
}

fn push_item(prompt: &mut String, item: &CatalogItem) {
	prompt.push_str(item.display_title());

	if !item.attrs.genres.is_empty() {
		prompt.push_str(&format!(" ({})", item.attrs.genres.join(", ")));
	}

	prompt.push('\n');

	if let Some(synopsis) = &item.attrs.synopsis {
		prompt.push_str(synopsis);
		prompt.push('\n');
	}
	if let Some(summary) = &item.web_summary {
		prompt.push_str(&format!("Web notes: {summary}\n"));
	}
}

fn push_profile(prompt: &mut String, state: &WorkflowState) {
	prompt.push_str("[Reader profile]\n");
	prompt.push_str(&format!("- Gender: {}\n", state.profile.gender.as_str()));
	prompt.push_str(&format!("- Age bracket: {}\n", state.profile.age_bracket.as_str()));
	prompt.push_str(&format!("- Audience: {}\n", state.audience.as_str()));

	if !state.profile.genres.is_empty() {
		prompt.push_str(&format!("- Preferred genres: {}\n", state.profile.genres.join(", ")));
	}
}

/// Ranking prompt: the reader's favorites and profile followed by the
/// numbered candidate list and a strict JSON reply contract. The list is
/// capped so the prompt stays within a predictable size.
pub fn ranking_prompt(state: &WorkflowState, candidate_cap: usize) -> String {
	let mut prompt = String::from("You are a manga recommendation expert.\n\n[Favorite manga]\n");

	for favorite in &state.favorites {
		prompt.push_str("- ");
		push_item(&mut prompt, favorite);
	}

	prompt.push('\n');
	push_profile(&mut prompt, state);
	prompt.push_str("\n[Candidates]\n");

	let shown = state.candidates.len().min(candidate_cap);

	for (at, candidate) in state.candidates[..shown].iter().enumerate() {
		prompt.push_str(&format!("{}. ", at + 1));
		push_item(&mut prompt, &candidate.item);
	}

	prompt.push_str(&format!(
		"\nPick, from the {shown} candidates above, the 3 best matches for this reader. For \
		 each pick explain the concrete connection to the favorites. Use the list numbers \
		 exactly as given.\nReply with JSON only, in this shape:\n{{\"recommendations\": \
		 [{{\"index\": <number>, \"reason\": \"<why>\"}}]}}\n"
	));

	prompt
}

/// Grading prompt: profile, favorites, and the picked items with their
/// reasons, to be graded on a 0-100 scale where 75 and above passes.
pub fn grading_prompt(state: &WorkflowState) -> String {
	let mut prompt =
		String::from("You are the quality judge of a manga recommendation system.\n\n");

	push_profile(&mut prompt, state);
	prompt.push_str("\n[Favorite manga]\n");

	for favorite in &state.favorites {
		prompt.push_str("- ");
		push_item(&mut prompt, favorite);
	}

	prompt.push_str(&format!("\n[Recommendations ({} total)]\n", state.recommendations.len()));

	for (at, (candidate, rec)) in state.recommended_items().into_iter().enumerate() {
		prompt.push_str(&format!("{}. ", at + 1));
		push_item(&mut prompt, &candidate.item);
		prompt.push_str(&format!("Reason: {}\n", rec.reason));
	}

	prompt.push_str(
		"\nJudge whether these picks fit the reader. Reply with JSON only, in this \
		 shape:\n{\"score\": <0-100>, \"pass\": <true when the score is 75 or higher>}\n",
	);

	prompt
}
