use crate::profile::{AgeBracket, Gender};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Audience {
	Kids,
	Shounen,
	Shoujo,
	Seinen,
	Josei,
}
impl Audience {
	/// Total mapping from age bracket and gender. The youngest bracket ignores
	/// gender, the teen bracket splits into Shounen/Shoujo, and every adult
	/// bracket splits into Seinen/Josei. Unspecified gender takes the
	/// male-targeted variant.
	pub fn for_profile(age_bracket: AgeBracket, gender: Gender) -> Self {
		match age_bracket {
			AgeBracket::From12To15 => Self::Kids,
			AgeBracket::From15To18 => match gender {
				Gender::Female => Self::Shoujo,
				_ => Self::Shounen,
			},
			_ => match gender {
				Gender::Female => Self::Josei,
				_ => Self::Seinen,
			},
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Kids => "Kids",
			Self::Shounen => "Shounen",
			Self::Shoujo => "Shoujo",
			Self::Seinen => "Seinen",
			Self::Josei => "Josei",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn youngest_bracket_ignores_gender() {
		for gender in [Gender::Male, Gender::Female, Gender::Unspecified] {
			assert_eq!(Audience::for_profile(AgeBracket::From12To15, gender), Audience::Kids);
		}
	}

	#[test]
	fn teen_bracket_splits_by_gender() {
		assert_eq!(Audience::for_profile(AgeBracket::From15To18, Gender::Male), Audience::Shounen);
		assert_eq!(Audience::for_profile(AgeBracket::From15To18, Gender::Female), Audience::Shoujo);
		assert_eq!(
			Audience::for_profile(AgeBracket::From15To18, Gender::Unspecified),
			Audience::Shounen
		);
	}

	#[test]
	fn adult_brackets_split_by_gender() {
		for age_bracket in [
			AgeBracket::From18To30,
			AgeBracket::From30To40,
			AgeBracket::From40To50,
			AgeBracket::Above50,
		] {
			assert_eq!(Audience::for_profile(age_bracket, Gender::Male), Audience::Seinen);
			assert_eq!(Audience::for_profile(age_bracket, Gender::Female), Audience::Josei);
			assert_eq!(Audience::for_profile(age_bracket, Gender::Unspecified), Audience::Seinen);
		}
	}
}
