//! Region names and the countries and cities they cover.

/// Lowercase region key to the places that count as inside it.
pub(super) static REGIONS: &[(&str, &[&str])] = &[
	(
		"asia",
		&[
			"afghanistan", "armenia", "azerbaijan", "bahrain", "bangladesh", "bhutan", "brunei",
			"cambodia", "china", "cyprus", "georgia", "india", "indonesia", "iran", "iraq",
			"israel", "japan", "jordan", "kazakhstan", "kuwait", "kyrgyzstan", "laos", "lebanon",
			"malaysia", "maldives", "mongolia", "myanmar", "nepal", "north korea", "oman",
			"pakistan", "palestine", "philippines", "qatar", "saudi arabia", "singapore",
			"south korea", "sri lanka", "syria", "taiwan", "tajikistan", "thailand",
			"timor-leste", "turkey", "turkmenistan", "united arab emirates", "uae", "uzbekistan",
			"vietnam", "yemen", "dhaka", "mumbai", "delhi", "bangalore", "karachi", "shanghai",
			"beijing", "tokyo", "manila", "jakarta", "bangkok", "ho chi minh", "hanoi",
		],
	),
	(
		"europe",
		&[
			"albania", "andorra", "austria", "belarus", "belgium", "bosnia", "herzegovina",
			"bulgaria", "croatia", "czech republic", "denmark", "estonia", "finland", "france",
			"germany", "greece", "hungary", "iceland", "ireland", "italy", "kosovo", "latvia",
			"liechtenstein", "lithuania", "luxembourg", "malta", "moldova", "monaco",
			"montenegro", "netherlands", "north macedonia", "norway", "poland", "portugal",
			"romania", "russia", "san marino", "serbia", "slovakia", "slovenia", "spain",
			"sweden", "switzerland", "ukraine", "uk", "united kingdom", "vatican", "milan",
			"rome", "paris", "berlin", "london", "madrid", "barcelona", "amsterdam", "brussels",
			"vienna", "prague", "budapest", "warsaw",
		],
	),
	(
		"canada",
		&["canada", "toronto", "vancouver", "montreal", "ottawa", "calgary"],
	),
	(
		"north america",
		&[
			"usa", "united states", "america", "mexico", "canada", "new york", "los angeles",
			"chicago", "houston", "phoenix", "philadelphia", "san antonio", "san diego",
			"dallas", "san jose", "austin", "portland",
		],
	),
	(
		"central america",
		&[
			"belize", "costa rica", "el salvador", "guatemala", "honduras", "nicaragua", "panama",
		],
	),
	(
		"south america",
		&[
			"argentina", "bolivia", "brazil", "chile", "colombia", "ecuador", "guyana",
			"paraguay", "peru", "suriname", "uruguay", "venezuela", "sao paulo",
			"rio de janeiro", "buenos aires", "bogota", "lima",
		],
	),
	(
		"africa",
		&[
			"algeria", "angola", "benin", "botswana", "burkina faso", "burundi", "cameroon",
			"cape verde", "central african republic", "chad", "comoros", "congo", "djibouti",
			"egypt", "equatorial guinea", "eritrea", "ethiopia", "gabon", "gambia", "ghana",
			"guinea", "guinea-bissau", "ivory coast", "kenya", "lesotho", "liberia", "libya",
			"madagascar", "malawi", "mali", "mauritania", "mauritius", "morocco", "mozambique",
			"namibia", "niger", "nigeria", "rwanda", "sao tome", "senegal", "seychelles",
			"sierra leone", "somalia", "south africa", "south sudan", "sudan", "tanzania", "togo",
			"tunisia", "uganda", "zambia", "zimbabwe", "cairo", "lagos", "nairobi",
			"johannesburg", "cape town",
		],
	),
];

/// Places covered by `region`, if it names one.
pub(super) fn places(region: &str) -> Option<&'static [&'static str]> {
	REGIONS
		.iter()
		.find(|(name, _)| *name == region)
		.map(|(_, places)| *places)
}
