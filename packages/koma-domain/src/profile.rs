#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Gender {
	Male,
	Female,
	#[default]
	Unspecified,
}
impl Gender {
	pub fn parse(token: &str) -> Self {
		match token.trim().to_ascii_lowercase().as_str() {
			"male" => Self::Male,
			"female" => Self::Female,
			_ => Self::Unspecified,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Male => "male",
			Self::Female => "female",
			Self::Unspecified => "unspecified",
		}
	}
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AgeBracket {
	From12To15,
	From15To18,
	#[default]
	From18To30,
	From30To40,
	From40To50,
	Above50,
}
impl AgeBracket {
	/// Unrecognized tokens fall back to the first adult bracket, which keeps
	/// the audience mapping total.
	pub fn parse(token: &str) -> Self {
		match token.trim() {
			"12~15" => Self::From12To15,
			"15~18" => Self::From15To18,
			"18~30" => Self::From18To30,
			"30~40" => Self::From30To40,
			"40~50" => Self::From40To50,
			"50~" => Self::Above50,
			_ => Self::From18To30,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::From12To15 => "12~15",
			Self::From15To18 => "15~18",
			Self::From18To30 => "18~30",
			Self::From30To40 => "30~40",
			Self::From40To50 => "40~50",
			Self::Above50 => "50~",
		}
	}
}

#[derive(Clone, Debug)]
pub struct UserProfile {
	pub gender: Gender,
	pub age_bracket: AgeBracket,
	pub genres: Vec<String>,
	pub favorite_title: String,
}
impl UserProfile {
	pub fn from_tokens(
		gender: &str,
		age_bracket: &str,
		genres: Vec<String>,
		favorite_title: String,
	) -> Self {
		Self {
			gender: Gender::parse(gender),
			age_bracket: AgeBracket::parse(age_bracket),
			genres,
			favorite_title,
		}
	}
}
